use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cfg = fingergate::config::Config::parse();
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(fingergate::run(cfg))
}
