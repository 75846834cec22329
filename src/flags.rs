use std::path::PathBuf;

xflags::xflags! {
    /// Linked data renderings of the gazetteer.
    cmd pleiades-rdf {
        /// TOML configuration file
        optional -c,--config config: PathBuf

        /// Serve Turtle and RDF/XML over HTTP
        cmd serve {}

        /// Load a JSON content snapshot into the store
        cmd import {
            required snapshot: PathBuf
        }

        /// Write a Turtle dump to standard output
        cmd dump {
            /// Dump every author
            optional -a,--authors
            /// Dump a named vocabulary
            optional -v,--vocabulary name: String
            /// Dump a place or comma separated places
            optional -p,--places ids: String
            /// Interpret places as an inclusive "min,max" range
            optional -r,--range
        }
    }
}
