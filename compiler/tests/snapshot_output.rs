// Snapshot tests: lock the human-readable renderings (disassembly listing and
// DOT) to detect unintended changes in emission order or formatting.
//
// Snapshots are inline and managed by `insta`. Run `cargo insta review` after
// intentional output changes to update baselines.

use std::path::{Path, PathBuf};

use logicc::project::{self, LoadOptions};

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load(name: &str) -> logicc::graph::Graph {
    let text = std::fs::read_to_string(fixtures_dir().join(name)).unwrap();
    project::load(&text, &LoadOptions::default()).unwrap().graph
}

fn asm(name: &str) -> String {
    let program = logicc::compile(&load(name)).unwrap();
    let insts = logicc::disasm::disassemble(&program.bytes).unwrap();
    logicc::disasm::listing(&insts)
}

#[test]
fn analog_window_listing() {
    insta::assert_snapshot!(asm("analog_window_or.json"), @r###"
    0000  SET_PIN_MODE_INPUT  pin 16
    0002  SET_PIN_MODE_OUTPUT pin 13
    0004  READ_ANALOG_PIN     pin 16 -> v0
    0007  ANALOG_RANGE        v0 in [600, 1023] -> v1
    0014  ANALOG_RANGE        v0 in [0, 500] -> v2
    0021  OR                  v2 v1 -> v3
    0026  WRITE_PIN           v3 -> pin 13
    "###);
}

#[test]
fn buttons_with_or_listing() {
    insta::assert_snapshot!(asm("buttons_with_or.json"), @r###"
    0000  SET_PIN_MODE_INPUT  pin 2
    0002  SET_PIN_MODE_OUTPUT pin 8
    0004  SET_PIN_MODE_INPUT  pin 3
    0006  SET_PIN_MODE_INPUT  pin 4
    0008  SET_PIN_MODE_INPUT  pin 5
    0010  SET_PIN_MODE_INPUT  pin 6
    0012  SET_PIN_MODE_INPUT  pin 7
    0014  READ_PIN            pin 2 -> v0
    0017  READ_PIN            pin 3 -> v1
    0020  READ_PIN            pin 4 -> v2
    0023  READ_PIN            pin 5 -> v3
    0026  READ_PIN            pin 6 -> v4
    0029  READ_PIN            pin 7 -> v5
    0032  NOT                 v0 -> v6
    0035  OR                  v1 v2 -> v7
    0040  TOGGLE              v3 -> v8 init 0
    0044  LATCH               set v4 reset v5 -> v9 init 0
    0049  AND                 v6 v7 v8 v9 -> v10
    0056  WRITE_PIN           v10 -> pin 8
    "###);
}

#[test]
fn direct_wiring_dot_shows_synthetic_merge() {
    let normalized = logicc::normalize::normalize(&load("analog_window_direct.json")).graph;
    let order = logicc::schedule::dependency_order(&normalized).unwrap();
    let slots = logicc::slots::allocate_slots(&normalized, &order).unwrap();

    insta::assert_snapshot!(logicc::dot::emit_dot(&normalized, Some(&slots)), @r###"
    digraph logic {
        rankdir=LR;
        node [fontname="Helvetica", fontsize=10];
        edge [fontname="Helvetica", fontsize=9];

        n0 [label="input1\ninput pin 16\nv0", shape=invhouse];
        n1 [label="analog1\nanalog-range [0, 500]\nv2", shape=box];
        n2 [label="analog2\nanalog-range [600, 1023]\nv1", shape=box];
        n3 [label="output1\noutput pin 13", shape=house];
        n4 [label="output1.in.or\nOR\nv3", shape=box, style=dashed];

        n0 -> n2 [label="in"];
        n0 -> n1 [label="in"];
        n1 -> n4 [label="in0"];
        n2 -> n4 [label="in1"];
        n4 -> n3 [label="in"];
    }
    "###);
}
