// (c) Copyright 2026 golf-extract contributors
// SPDX-License-Identifier: MIT

//! Compiles the public OSM PBF schema (`proto/fileformat.proto`,
//! `proto/osmformat.proto`) into Rust with the pure-Rust `protobuf-codegen`
//! backend, so building this crate never needs a `protoc` binary.

fn main() {
    protobuf_codegen::Codegen::new()
        .pure()
        .includes(["proto"])
        .inputs(["proto/fileformat.proto", "proto/osmformat.proto"])
        .cargo_out_dir("pbf_proto")
        .run_from_script();
}
