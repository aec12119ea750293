fn main() -> anyhow::Result<()> {
    let command_line_interface = typed_params::cli::CommandLineInterface::load();
    command_line_interface.run()
}
