#![doc = "cellgraph public API: redistribute cell-level interaction graphs onto census blocks"]
mod aggregate;
mod assign;
mod attributes;
mod config;
mod error;
mod graph;
mod io;
mod overlap;
mod redistribute;
mod region;

#[doc(inline)]
pub use region::{Partition, Region, RegionId};

#[doc(inline)]
pub use overlap::{compute_overlaps, snap_fraction, OverlapMap, OverlapRecord, SourceShare, TargetShare, SNAP_TOLERANCE};

#[doc(inline)]
pub use graph::{
    Accumulable, Activity, ActivityTally, Channel, DirectionalSum, EdgeKey, EdgeMap, Graph, NodeId, NodeKind,
    TallyGraph, WeightedGraph,
};

#[doc(inline)]
pub use attributes::{
    annotate_blocks, annotate_categories, calling_code_names, fill_holes, lookup, merge_block_attributes, AttrValue,
    AttributeTable, Attributes, CategoryNames, Lookup, MergeReport, CODE_FIELD, DEFAULT_ID_FIELD, NAME_FIELD,
};

#[doc(inline)]
pub use redistribute::{
    accumulate_block_contributions, correct_double_counting, redistribute_blocks, redistribute_categories,
    Redistribution,
};

#[doc(inline)]
pub use aggregate::{
    discover_extracts, load_checkpoint, open_extract, read_extract, save_checkpoint, Accumulate, Aggregator,
    CategoryRecord, Checkpoint, ExtractSummary, PairRecord, Stage, Universe,
};

#[doc(inline)]
pub use assign::{assign_points, mean_count, Assignment};

#[doc(inline)]
pub use config::Settings;

#[doc(inline)]
pub use error::RecordError;

#[doc(inline)]
pub use io::{
    ensure_dir_exists, node_table, parse_regions_geojson, read_attribute_csv, read_attribute_dir, read_json,
    read_partition, read_partition_geojson, read_partition_shapefile, read_points_geojson, write_json_atomic,
    write_node_tables, IdSource, PendingWrite, PointFeature,
};
