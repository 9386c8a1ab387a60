// symwalk command-line entry point.
// Usage: cargo run --bin symwalk -- expand program.lisp

fn main() {
    symwalk::cli::run();
}
