use anyhow::Result;

fn main() -> Result<()> {
    jtl::cli::run(jtl::cli::Tool::ValuerTranscript)
}
