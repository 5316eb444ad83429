use clap::Parser;

/// This is a tally processing program for the Uruguayan departmental elections.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON configuration file describing the sources, the party aliases and the seat rules.
    /// For more information about the file format, read the manual of the departmental_tally crate.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference file containing the expected summary in JSON format. If provided, escrutinio will
    /// check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary will be written in JSON format to the given
    /// location. Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) If specified, the source file to process. Setting this option overrides the sources
    /// that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default auto) The layout of the input. Only v2020 is currently supported; auto detects it.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default 2020) The election year of the input.
    #[clap(short, long, value_parser)]
    pub year: Option<u32>,

    /// (file path) The party alias table in JSON format. Overrides the one of the --config option.
    #[clap(short, long, value_parser)]
    pub aliases: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
