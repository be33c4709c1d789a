use bean_compose::{
    cli::{output, run, Cli},
    init,
};
use clap::Parser;

fn main() {
    let cli = Cli::parse();
    init();

    if let Err(err) = run(cli) {
        output::fatal(err);
        std::process::exit(1);
    }
}
