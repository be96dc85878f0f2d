//! One-shot command-line entry point.

use std::env;
use std::io;
use std::process::exit;

use python_config::cli::{self, Invocation};
use python_config::load;

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let invocation = match Invocation::from_args(&args) {
        Ok(invocation) => invocation,
        Err(cli::UsageError) => {
            let prog = env::args()
                .next()
                .unwrap_or_else(|| "python-config".to_string());
            println!("{}", cli::usage(&prog));
            exit(1);
        }
    };

    let result =
        load().and_then(|config| cli::print_values(&invocation, &config, &mut io::stdout()));
    if let Err(error) = result {
        println!("ERROR: {}", error.report());
        exit(1);
    }
}
