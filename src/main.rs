use repo_packer::cli::commands::run;

fn main() -> anyhow::Result<()> {
    run()
}
