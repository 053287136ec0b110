//! Diagnostics for native dev builds.
//!
//! Compiled only behind `dev_native` (see `main.rs`).

use bevy::diagnostic::{
    EntityCountDiagnosticsPlugin, FrameTimeDiagnosticsPlugin, LogDiagnosticsPlugin,
};
use bevy::input::common_conditions::input_just_pressed;
use bevy::prelude::*;

use crate::runtime::InteractionRuntime;

pub(super) fn plugin(app: &mut App) {
    app.add_plugins((
        FrameTimeDiagnosticsPlugin::default(),
        EntityCountDiagnosticsPlugin::default(),
        LogDiagnosticsPlugin::default(),
    ));

    app.add_systems(Update, dump_pointers.run_if(input_just_pressed(KeyCode::F3)));
}

/// Log every pointer's current hit and any manipulation it drives.
fn dump_pointers(runtime: NonSend<InteractionRuntime>) {
    let system = &runtime.system;
    for pointer in system.pointers() {
        let result = pointer.result();
        let held = system
            .manipulation()
            .session(pointer.id())
            .map(|s| s.target);
        info!(
            "{:?} {:?} extent={:.2} target={:?} distance={:.2} held={:?}",
            pointer.id(),
            pointer.adapter(),
            pointer.extent(),
            result.target,
            result.distance,
            held,
        );
    }
}
