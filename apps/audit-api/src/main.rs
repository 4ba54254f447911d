use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = audit_api::Args::parse();

	audit_api::run(args).await
}
