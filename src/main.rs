#![doc = include_str!("../README.md")]
use anyhow::Result;
use dok::{run, setup_tracing, Args, SystemCommandRunner, Terminal};

#[paw::main]
fn main(args: Args) -> Result<()> {
    let config = args.load_config()?;
    setup_tracing(args.verbose.get_level_filter(&config.verbose))?;
    let code = run(&args, &config, &SystemCommandRunner, &mut Terminal::default());
    std::process::exit(code)
}
