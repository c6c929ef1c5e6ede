pub const AAGUID: [u8; 16] = [
    0x5f, 0x1a, 0x0e, 0x8b, 0x7c, 0x42, 0x4d, 0x19, 0xa3, 0x6e, 0x2b, 0x90, 0x00, 0x00, 0x00, 0x01,
];
pub const USER_AGENT: &str = concat!("fingergate/", env!("CARGO_PKG_VERSION"));
pub const HTTP_TIMEOUT_SECS: u64 = 30;
pub const UV_TIMEOUT_SECS: u64 = 30;

#[derive(clap::Parser, Debug, Clone)]
#[command(version, about)]
pub struct Config {
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
    /// Base URL of the verification API.
    #[arg(long, env = "FINGERGATE_SERVER", default_value = "http://localhost:8000/api")]
    pub server: String,
    /// Bearer token of the signed-in session.
    #[arg(long, env = "FINGERGATE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
    /// Origin reported in client data.
    #[arg(long, default_value = "http://localhost:3000")]
    pub origin: String,
    #[arg(long, default_value = "pinentry")]
    pub pinentry: String,
    /// Give up on the platform ceremony after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub ceremony_timeout: Option<u64>,
    /// Enrollment attempts before giving up.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub attempts: u32,
    /// Sign in with the new credential once enrollment passes.
    #[arg(long)]
    pub confirm: bool,
    /// Run the preflight checks and exit.
    #[arg(long)]
    pub doctor: bool,
}
