// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Gather build time info. The default OBSERVATION observer and the
    // version logged when creating measurement sets come from here.
    built::write_built_file().expect("Failed to acquire build-time information");
}
