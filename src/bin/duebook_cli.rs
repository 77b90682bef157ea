use duebook_core::cli::run_cli;

fn main() {
    duebook_core::init();
    if let Err(err) = run_cli() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
