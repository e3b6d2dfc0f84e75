use clap::Parser;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = encore::runtime::Cli::parse();
    encore::runtime::run(cli)
}
