//! Command-line front end for Quire writing projects.

mod cli;

fn main() {
    cli::run_cli();
}
