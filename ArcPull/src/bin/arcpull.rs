fn main() -> anyhow::Result<()> {
    arcpull::cli::run_cli()
}
