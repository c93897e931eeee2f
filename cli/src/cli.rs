use std::path::PathBuf;

use cellgraph::{Channel, IdSource};

/// Cell-graph redistribution pipeline
#[derive(clap::Parser, Debug)]
#[command(name = "cellgraph", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// JSON settings file overriding the built-in defaults
    #[arg(long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Compute cell/block overlap fractions
    Overlap(OverlapArgs),

    /// Stream interaction extracts into a cell-level graph
    Aggregate(AggregateArgs),

    /// Project a cell-level graph onto census blocks
    Redistribute(RedistributeArgs),

    /// Attach census attributes and category names to a block graph
    Annotate(AnnotateArgs),

    /// Write a graph as per-kind CSV node tables
    Export(ExportArgs),

    /// Build the calling-code name table for the categories of some graphs
    Names(NamesArgs),

    /// Assign point features to the regions containing them
    Assign(AssignArgs),
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtractKind {
    /// time, cell1, cell2, strength
    Pairs,
    /// cell, time, code, sms in/out, call in/out, internet
    Categories,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Topology {
    /// Cell-to-cell edges become block-to-block edges
    Blocks,
    /// Cell-to-category edges become block-to-category edges
    Categories,
}

#[derive(clap::Args, Debug)]
pub struct OverlapArgs {
    /// Source partition (cells): GeoJSON file or shapefile
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub cells: PathBuf,

    /// Target partition (blocks): GeoJSON file, directory of GeoJSON files, or shapefile
    #[arg(value_hint = clap::ValueHint::AnyPath)]
    pub blocks: PathBuf,

    /// Output overlap map, defaults to "./overlaps.json"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Id location in the cell features, e.g. cellId or property:cellId
    #[arg(long)]
    pub cell_ids: Option<IdSource>,

    /// Id location in the block features, e.g. description:SEZ2011
    #[arg(long)]
    pub block_ids: Option<IdSource>,
}

#[derive(clap::Args, Debug)]
pub struct AggregateArgs {
    /// Extract file, or directory searched for .txt/.txt.gz extracts
    #[arg(value_hint = clap::ValueHint::AnyPath)]
    pub input: PathBuf,

    /// Extract line format
    #[arg(short, long, value_enum)]
    pub kind: ExtractKind,

    /// Overlap map; when given, only cells covered by some block are kept
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub overlaps: Option<PathBuf>,

    /// Checkpoint file, resumed from if present and rewritten after each extract
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub checkpoint: Option<PathBuf>,

    /// Output graph, defaults to "./cells.json"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct RedistributeArgs {
    /// Cell-level graph written by `aggregate`
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub graph: PathBuf,

    /// Overlap map written by `overlap`
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub overlaps: PathBuf,

    /// Target topology
    #[arg(short, long, value_enum)]
    pub topology: Topology,

    /// Traffic channel used as edge weight for category graphs (call, sms, internet)
    #[arg(short, long, default_value = "call")]
    pub channel: Channel,

    /// Output graph, defaults to "./blocks.json"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct AnnotateArgs {
    /// Block-level graph written by `redistribute`
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub graph: PathBuf,

    /// Attribute table: JSON file, `;`-separated CSV file, or directory of CSV files
    #[arg(long, value_hint = clap::ValueHint::AnyPath)]
    pub attributes: PathBuf,

    /// Category name table written by `names`
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub names: Option<PathBuf>,

    /// Output graph, defaults to overwriting the input
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Graph to export
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub graph: PathBuf,

    /// Output directory, defaults to "."
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct NamesArgs {
    /// Graphs whose category nodes need names
    #[arg(required = true, value_hint = clap::ValueHint::FilePath)]
    pub graphs: Vec<PathBuf>,

    /// JSON object: ISO abbreviation -> country name
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub countries: PathBuf,

    /// JSON object: ISO abbreviation -> phone code string
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub phones: PathBuf,

    /// Output name table, defaults to "./category_names.json"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct AssignArgs {
    /// GeoJSON FeatureCollection of point features
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub points: PathBuf,

    /// Partition to assign into: GeoJSON file/directory or shapefile
    #[arg(value_hint = clap::ValueHint::AnyPath)]
    pub regions: PathBuf,

    /// Id location in the region features
    #[arg(long, default_value = "cellId")]
    pub ids: IdSource,

    /// Feature member holding the point, when it is not the geometry
    #[arg(long)]
    pub coords_key: Option<String>,

    /// Property counted per region as distinct values (e.g. user)
    #[arg(long)]
    pub distinct: Option<String>,

    /// Output assignment, defaults to "./assignment.json"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}
