#![forbid(unsafe_code)]

use structopt::StructOpt;

use coreppl::cli::{self, Opt};

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimallocator::Mimalloc = mimallocator::Mimalloc;

fn main() {
    let opt = Opt::from_args();
    cli::run(&opt);
}
