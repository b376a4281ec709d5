use std::process;

fn main() {
    let status = zenv::cli::run();
    process::exit(status as i32);
}
