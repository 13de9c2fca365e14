fn main() -> anyhow::Result<()> {
    packer::run()
}
