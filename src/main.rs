fn main() -> anyhow::Result<()> {
    s2p_validator_lib::run()
}
