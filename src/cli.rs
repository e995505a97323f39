use clap::Parser;
use clap::builder::TypedValueParser;

use crate::zip::DEFAULT_CHUNK_SIZE;

#[derive(Parser, Debug)]
#[command(name = "zipstream")]
#[command(version)]
#[command(about = "Stream members out of a ZIP archive by local header offset", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipstream data1.zip --at 0 --at 0x1f40          extract two members into the current directory\n  \
  zipstream -p foo.zip --at 128 | more            send one member's content into more\n  \
  zipstream -l https://example.com/a.zip --at 0   show a remote member's header")]
pub struct Cli {
    /// ZIP file path or HTTP URL
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Offset of a member's local file header (decimal or 0x-prefixed hex)
    #[arg(long = "at", value_name = "OFFSET", required = true, value_parser = parse_offset)]
    pub offsets: Vec<u64>,

    /// List members (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Extract members to pipe, no messages
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Extract members into exdir
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<String>,

    /// Skip members whose destination already exists instead of failing
    #[arg(short = 'n')]
    pub never_overwrite: bool,

    /// Junk paths (do not make directories)
    #[arg(short = 'j')]
    pub junk_paths: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Largest chunk read or written at once, in bytes
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_CHUNK_SIZE,
          value_parser = clap::value_parser!(u64).range(1..).map(|v| v as usize))]
    pub chunk_size: usize,

    /// Do not compare extracted content with the recorded CRC32
    #[arg(long)]
    pub no_verify: bool,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.file.starts_with("http://") || self.file.starts_with("https://")
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }
}

fn parse_offset(value: &str) -> Result<u64, String> {
    let parsed = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|e| format!("invalid offset `{value}`: {e}"))
}
