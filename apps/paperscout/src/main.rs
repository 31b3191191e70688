use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = paperscout::Args::parse();

	paperscout::run(args).await
}
