/// An investigation operation offered by `schemadoc inspect`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feature {
    pub name: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
}

pub const FEATURES: &[Feature] = &[
    Feature {
        name: "features",
        usage: "schemadoc inspect features",
        description: "Displays this list of available features.",
    },
    Feature {
        name: "tables",
        usage: "schemadoc inspect tables [--schema S | --all-schemas]",
        description: "Lists tables of one schema or of every schema.",
    },
    Feature {
        name: "describe",
        usage: "schemadoc inspect describe TABLE [--schema S]",
        description: "Shows column types, nullability, primary key and foreign key targets of a table.",
    },
    Feature {
        name: "trace",
        usage: "schemadoc inspect trace COL=VALUE... [--mode and|or] [--all-schemas] [--show-records] [--limit N]",
        description: "Finds the tables holding the given values and ranks them by match count.",
    },
    Feature {
        name: "origin",
        usage: "schemadoc inspect origin FILE.json",
        description: "Traces every field of a denormalised JSON object and infers logical joins.",
    },
    Feature {
        name: "unique",
        usage: "schemadoc inspect unique TABLE --columns A,B [--schema S]",
        description: "Checks whether a column combination is unique across a table.",
    },
];
