use clap::Parser;

fn main() -> anyhow::Result<()> {
    labstock_observability::init();

    let cli = labstock_cli::Cli::parse();
    let output = labstock_cli::run(cli)?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}
