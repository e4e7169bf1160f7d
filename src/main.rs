use clap::Parser;

use splithunter::params::Parameters;

fn main() -> anyhow::Result<()> {
    let params = Parameters::parse();

    let default_filter = if params.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    splithunter::run(&params)
}
