use clap::Parser;

fn main() -> anyhow::Result<()> {
    bookmarklet::cli::Cli::parse().run()
}
