//! Built-in Bevy migration catalog, 0.12 through 0.18
//!
//! Rules mirror the published Bevy migration guides for each release. Steps
//! with a large surface are split into ordered parts so related renames land
//! together. Callback rules handle the few changes a template cannot express.

use crate::chain::MigrationSet;
use crate::rule::{CallbackRegistry, Captures, MigrationUnit, Rule};
use std::path::Path;

/// The supported version chain, oldest first
pub const VERSIONS: &[&str] = &["0.12", "0.13", "0.14", "0.15", "0.16", "0.17", "0.18"];

/// Registry with every callback the built-in rules reference
pub fn callbacks() -> CallbackRegistry {
    let mut registry = CallbackRegistry::new();
    registry.register("camera_hdr_split", camera_hdr_split);
    registry.register("ui_transform_note", ui_transform_note);
    registry.register("volume_add", volume_add);
    registry.register("volume_sub", volume_sub);
    registry
}

/// Camera::hdr became the standalone Hdr component. The field cannot be
/// rewritten mechanically, so leave a marker where it was.
fn camera_hdr_split(_caps: &Captures, _path: &Path) -> String {
    "Camera { /* hdr: moved to the Hdr component, add Hdr to this entity */".to_string()
}

/// UI nodes now use UiTransform. Only the translation carries over.
fn ui_transform_note(caps: &Captures, _path: &Path) -> String {
    let x = caps.get("X").map(String::as_str).unwrap_or("0.0");
    let y = caps.get("Y").map(String::as_str).unwrap_or("0.0");
    format!("UiTransform {{ translation: Val2::px({x}, {y}), ..default() }}")
}

fn volume_add(caps: &Captures, _path: &Path) -> String {
    let volume = caps.get("VOLUME").map(String::as_str).unwrap_or("volume");
    let percent = caps.get("PERCENT").map(String::as_str).unwrap_or("percent");
    format!("{volume}.increase_by_percentage({percent})")
}

fn volume_sub(caps: &Captures, _path: &Path) -> String {
    let volume = caps.get("VOLUME").map(String::as_str).unwrap_or("volume");
    let percent = caps.get("PERCENT").map(String::as_str).unwrap_or("percent");
    format!("{volume}.decrease_by_percentage({percent})")
}

/// The full built-in migration set
pub fn builtin() -> MigrationSet {
    let mut set = MigrationSet::new(VERSIONS);
    set.add_unit(v0_12_to_0_13());
    set.add_unit(v0_13_to_0_14());
    set.add_unit(v0_14_to_0_15_part1());
    set.add_unit(v0_14_to_0_15_part2());
    set.add_unit(v0_15_to_0_16());
    set.add_unit(v0_16_to_0_17_part1());
    set.add_unit(v0_16_to_0_17_part2());
    set.add_unit(v0_16_to_0_17_part3());
    set.add_unit(v0_17_to_0_18());
    set
}

fn v0_12_to_0_13() -> MigrationUnit {
    MigrationUnit::new(
        "0.12",
        "0.13",
        "ECS query split, Input rename, mesh shape rework",
        vec![
            Rule::new(
                "input-to-button-input",
                "Input<$T>",
                "ButtonInput<$T>",
                "Input renamed to ButtonInput",
            ),
            Rule::new(
                "option-with-to-has",
                "Option<With<$T>>",
                "Has<$T>",
                "Option<With<T>> replaced by Has<T>",
            ),
            Rule::new(
                "world-query-derive",
                "#[derive(WorldQuery)]",
                "#[derive(QueryData)]",
                "WorldQuery derive renamed to QueryData",
            ),
            Rule::new(
                "world-query-attr",
                "#[world_query($ARGS)]",
                "#[query_data($ARGS)]",
                "world_query attribute renamed to query_data",
            ),
            Rule::new(
                "readonly-world-query",
                "ReadOnlyWorldQuery",
                "QueryFilter",
                "ReadOnlyWorldQuery renamed to QueryFilter",
            ),
            Rule::new(
                "add-state-to-init-state",
                "$APP.add_state($STATE)",
                "$APP.init_state($STATE)",
                "App::add_state renamed to init_state",
            ),
            Rule::new(
                "shape-cube",
                "shape::Cube",
                "Cuboid",
                "shape::Cube replaced by the Cuboid primitive",
            ),
            Rule::new(
                "shape-quad",
                "shape::Quad",
                "Rectangle",
                "shape::Quad replaced by the Rectangle primitive",
            ),
            Rule::new(
                "shape-uvsphere",
                "shape::UVSphere",
                "Sphere",
                "shape::UVSphere replaced by the Sphere primitive",
            ),
            Rule::new(
                "shape-capsule",
                "shape::Capsule",
                "Capsule3d",
                "shape::Capsule replaced by the Capsule3d primitive",
            ),
            Rule::new(
                "text-alignment",
                "TextAlignment",
                "JustifyText",
                "TextAlignment renamed to JustifyText",
            ),
            Rule::new(
                "timer-percent",
                "$TIMER.percent()",
                "$TIMER.fraction()",
                "Timer::percent renamed to fraction",
            ),
            Rule::new(
                "timer-percent-left",
                "$TIMER.percent_left()",
                "$TIMER.fraction_remaining()",
                "Timer::percent_left renamed to fraction_remaining",
            ),
            Rule::new(
                "ray-struct",
                "Ray { $FIELDS }",
                "Ray3d { $FIELDS }",
                "Ray renamed to Ray3d",
            ),
            Rule::new(
                "fixed-update-loop",
                "RunFixedUpdateLoop",
                "RunFixedMainLoop",
                "RunFixedUpdateLoop renamed to RunFixedMainLoop",
            ),
        ],
    )
}

fn v0_13_to_0_14() -> MigrationUnit {
    MigrationUnit::new(
        "0.13",
        "0.14",
        "Color space rework, App::world accessors, asset loader builders",
        vec![
            // world() before world.id() style accesses get mangled
            Rule::new(
                "app-world-id",
                "$APP.world.id()",
                "$APP.world().id()",
                "App::world field became the world() method",
            )
            .priority(10),
            Rule::new(
                "app-world-spawn",
                "$APP.world.spawn($BUNDLE)",
                "$APP.world_mut().spawn($BUNDLE)",
                "Mutating access goes through world_mut()",
            )
            .priority(10),
            Rule::new(
                "app-exit-success",
                "writer.send(AppExit)",
                "writer.send(AppExit::Success)",
                "AppExit became an enum",
            ),
            Rule::new(
                "color-rgb",
                "Color::rgb($R, $G, $B)",
                "Color::srgb($R, $G, $B)",
                "Color::rgb renamed to srgb",
            ),
            Rule::new(
                "color-rgba",
                "Color::rgba($R, $G, $B, $A)",
                "Color::srgba($R, $G, $B, $A)",
                "Color::rgba renamed to srgba",
            ),
            Rule::new(
                "color-rgb-u8",
                "Color::rgb_u8($R, $G, $B)",
                "Color::srgb_u8($R, $G, $B)",
                "Color::rgb_u8 renamed to srgb_u8",
            ),
            Rule::new(
                "color-rgb-linear",
                "Color::rgb_linear($R, $G, $B)",
                "Color::linear_rgb($R, $G, $B)",
                "Color::rgb_linear renamed to linear_rgb",
            ),
            Rule::new(
                "color-set-a",
                "$COLOR.set_a($ALPHA)",
                "$COLOR.set_alpha($ALPHA)",
                "Color::set_a renamed to set_alpha",
            ),
            Rule::new(
                "color-with-a",
                "$COLOR.with_a($ALPHA)",
                "$COLOR.with_alpha($ALPHA)",
                "Color::with_a renamed to with_alpha",
            ),
            Rule::new(
                "load-direct",
                "load_context.load_direct($PATH)",
                "load_context.loader().direct().untyped().load($PATH)",
                "load_direct moved to the loader builder",
            ),
            Rule::new(
                "load-untyped",
                "load_context.load_untyped($PATH)",
                "load_context.loader().untyped().load($PATH)",
                "load_untyped moved to the loader builder",
            ),
            Rule::new(
                "command-path",
                "use bevy::ecs::system::Command",
                "use bevy::ecs::world::Command",
                "Command moved to bevy::ecs::world",
            ),
        ],
    )
}

fn v0_14_to_0_15_part1() -> MigrationUnit {
    MigrationUnit::new(
        "0.14",
        "0.15",
        "Commands queue, observers, event cursors",
        vec![
            Rule::new(
                "commands-add",
                "$COMMANDS.add($CMD)",
                "$COMMANDS.queue($CMD)",
                "Commands::add renamed to queue",
            ),
            Rule::new(
                "commands-push",
                "$COMMANDS.push($CMD)",
                "$COMMANDS.queue($CMD)",
                "Commands::push renamed to queue",
            ),
            Rule::new(
                "app-observe",
                "$APP.observe($OBSERVER)",
                "$APP.add_observer($OBSERVER)",
                "observe renamed to add_observer",
            ),
            Rule::new(
                "init-component",
                "$WORLD.init_component::<$T>()",
                "$WORLD.register_component::<$T>()",
                "init_component renamed to register_component",
            ),
            Rule::new(
                "manual-event-reader",
                "ManualEventReader",
                "EventCursor",
                "ManualEventReader renamed to EventCursor",
            ),
            Rule::new(
                "events-get-reader",
                "$EVENTS.get_reader()",
                "$EVENTS.get_cursor()",
                "get_reader renamed to get_cursor",
            ),
            Rule::new(
                "animation-graph-handle",
                "Handle<AnimationGraph>",
                "AnimationGraphHandle",
                "Graph handles got a dedicated component",
            ),
            Rule::new(
                "color-linear",
                "$COLOR.linear()",
                "$COLOR.to_linear()",
                "Color::linear renamed to to_linear",
            ),
            Rule::new(
                "register-one-shot",
                "$COMMANDS.register_one_shot_system($SYSTEM)",
                "$COMMANDS.register_system($SYSTEM)",
                "register_one_shot_system renamed to register_system",
            ),
        ],
    )
    .part(1)
}

fn v0_14_to_0_15_part2() -> MigrationUnit {
    MigrationUnit::new(
        "0.14",
        "0.15",
        "Required components replace bundles",
        vec![
            Rule::new(
                "camera2d-bundle-default",
                "Camera2dBundle::default()",
                "Camera2d",
                "Camera2dBundle::default() replaced by Camera2d",
            )
            .priority(10),
            Rule::new(
                "camera2d-bundle",
                "Camera2dBundle { $FIELDS }",
                "Camera2d",
                "Camera2dBundle replaced by the Camera2d component",
            ),
            Rule::new(
                "camera3d-bundle-default",
                "Camera3dBundle::default()",
                "Camera3d",
                "Camera3dBundle::default() replaced by Camera3d",
            )
            .priority(10),
            Rule::new(
                "camera3d-bundle",
                "Camera3dBundle { $FIELDS }",
                "Camera3d",
                "Camera3dBundle replaced by the Camera3d component",
            ),
            Rule::new(
                "audio-source-bundle",
                "AudioSourceBundle { source: $SOURCE, $REST }",
                "AudioPlayer($SOURCE)",
                "AudioSourceBundle replaced by AudioPlayer",
            ),
            // Field-specific forms first so the generic {..} catch-all
            // does not swallow them
            Rule::new(
                "pbr-bundle-transform",
                "PbrBundle { mesh: $MESH, material: $MAT, transform: $TRANSFORM, $REST }",
                "(Mesh3d($MESH), MeshMaterial3d($MAT), $TRANSFORM)",
                "PbrBundle replaced by Mesh3d + MeshMaterial3d + Transform",
            )
            .priority(10),
            Rule::new(
                "pbr-bundle",
                "PbrBundle { mesh: $MESH, material: $MAT, $REST }",
                "(Mesh3d($MESH), MeshMaterial3d($MAT))",
                "PbrBundle replaced by Mesh3d + MeshMaterial3d",
            ),
            Rule::new(
                "point-light-bundle-transform",
                "PointLightBundle { point_light: $LIGHT, transform: $TRANSFORM, $REST }",
                "($LIGHT, $TRANSFORM)",
                "PointLightBundle replaced by its components",
            )
            .priority(10),
            Rule::new(
                "point-light-bundle-default",
                "PointLightBundle::default()",
                "PointLight::default()",
                "PointLightBundle::default() replaced by PointLight",
            ),
            Rule::new(
                "material-mesh2d-bundle",
                "MaterialMesh2dBundle { mesh: $MESH, material: $MAT, $REST }",
                "(Mesh2d($MESH), MeshMaterial2d($MAT))",
                "MaterialMesh2dBundle replaced by Mesh2d + MeshMaterial2d",
            ),
        ],
    )
    .part(2)
}

fn v0_15_to_0_16() -> MigrationUnit {
    MigrationUnit::new(
        "0.15",
        "0.16",
        "Relationships, fallible queries, Volume enum",
        vec![
            Rule::new(
                "parent-import",
                "use bevy::hierarchy::Parent",
                "use bevy::hierarchy::ChildOf",
                "Parent renamed to ChildOf",
            ),
            Rule::new(
                "parent-query",
                "Query<&Parent>",
                "Query<&ChildOf>",
                "Parent renamed to ChildOf in queries",
            ),
            Rule::new(
                "despawn-recursive",
                "$COMMANDS.entity($E).despawn_recursive()",
                "$COMMANDS.entity($E).despawn()",
                "despawn is now recursive by default",
            ),
            Rule::new(
                "despawn-descendants",
                "$COMMANDS.entity($E).despawn_descendants()",
                "$COMMANDS.entity($E).despawn_related::<Children>()",
                "despawn_descendants renamed to despawn_related",
            ),
            Rule::new(
                "get-single",
                "$QUERY.get_single()",
                "$QUERY.single()",
                "get_single deprecated, single now returns Result",
            ),
            Rule::new(
                "get-single-mut",
                "$QUERY.get_single_mut()",
                "$QUERY.single_mut()",
                "get_single_mut deprecated, single_mut now returns Result",
            ),
            Rule::new(
                "volume-zero",
                "Volume::ZERO",
                "Volume::SILENT",
                "Volume::ZERO renamed to SILENT",
            )
            .priority(10),
            Rule::new(
                "volume-linear",
                "Volume($VALUE)",
                "Volume::Linear($VALUE)",
                "Volume became an enum with Linear and Decibels",
            ),
            Rule::new(
                "audio-sink-toggle",
                "$SINK.toggle()",
                "$SINK.toggle_playback()",
                "AudioSinkPlayback::toggle renamed to toggle_playback",
            ),
            Rule::new(
                "weak-handle",
                "Handle::weak_from_u128($UUID)",
                "weak_handle!(\"$UUID\")",
                "weak_from_u128 replaced by the weak_handle! macro",
            ),
            Rule::new(
                "child-builder",
                "builder: &mut ChildBuilder",
                "spawner: &mut ChildSpawnerCommands",
                "ChildBuilder renamed to ChildSpawnerCommands",
            ),
            Rule::new(
                "a11y-focus",
                "bevy::a11y::Focus",
                "bevy::input_focus::InputFocus",
                "Focus moved to bevy::input_focus as InputFocus",
            ),
        ],
    )
}

fn v0_16_to_0_17_part1() -> MigrationUnit {
    MigrationUnit::new(
        "0.16",
        "0.17",
        "Buffered events become messages, observer triggers become On",
        vec![
            Rule::new(
                "event-writer",
                "EventWriter<$T>",
                "MessageWriter<$T>",
                "EventWriter renamed to MessageWriter",
            ),
            Rule::new(
                "event-reader",
                "EventReader<$T>",
                "MessageReader<$T>",
                "EventReader renamed to MessageReader",
            ),
            Rule::new(
                "events-resource",
                "Events<$T>",
                "Messages<$T>",
                "Events renamed to Messages",
            ),
            Rule::new(
                "world-send-event",
                "$WORLD.send_event($EVENT)",
                "$WORLD.write_message($EVENT)",
                "send_event renamed to write_message",
            ),
            Rule::new(
                "send-event-batch",
                "$WORLD.send_event_batch($EVENTS)",
                "$WORLD.write_message_batch($EVENTS)",
                "send_event_batch renamed to write_message_batch",
            ),
            // Two-parameter form first
            Rule::new(
                "trigger-filtered",
                "trigger: Trigger<$E, $F>",
                "on: On<$E, $F>",
                "Trigger renamed to On",
            )
            .priority(10),
            Rule::new(
                "trigger",
                "trigger: Trigger<$E>",
                "on: On<$E>",
                "Trigger renamed to On",
            ),
            Rule::new(
                "trigger-target",
                "$TRIGGER.target()",
                "$TRIGGER.entity",
                "Observer target() became the entity field",
            ),
            Rule::new("on-add", "OnAdd", "Add", "OnAdd renamed to Add"),
            Rule::new("on-insert", "OnInsert", "Insert", "OnInsert renamed to Insert"),
            Rule::new("on-remove", "OnRemove", "Remove", "OnRemove renamed to Remove"),
            Rule::new(
                "state-scoped",
                "StateScoped",
                "DespawnOnExit",
                "StateScoped renamed to DespawnOnExit",
            ),
            Rule::new(
                "apply-deferred",
                "apply_deferred()",
                "ApplyDeferred",
                "apply_deferred function became the ApplyDeferred type",
            ),
        ],
    )
    .part(1)
}

fn v0_16_to_0_17_part2() -> MigrationUnit {
    MigrationUnit::new(
        "0.16",
        "0.17",
        "Render reorganization and camera changes",
        vec![
            Rule::with_callback(
                "camera-hdr",
                "Camera { hdr: true",
                "camera_hdr_split",
                "Camera::hdr split into the Hdr component",
            ),
            Rule::new(
                "computed-node-target",
                "ComputedNodeTarget",
                "ComputedUiTargetCamera",
                "ComputedNodeTarget renamed to ComputedUiTargetCamera",
            ),
            Rule::new(
                "weak-handle-uuid",
                "weak_handle!($UUID)",
                "uuid_handle!($UUID)",
                "weak_handle! renamed to uuid_handle!",
            ),
            Rule::new(
                "handle-weak-variant",
                "Handle::Weak",
                "Handle::Uuid",
                "Handle::Weak renamed to Handle::Uuid",
            ),
            Rule::new(
                "condition-import",
                "use bevy::ecs::schedule::Condition",
                "use bevy::ecs::schedule::SystemCondition",
                "Condition renamed to SystemCondition",
            ),
        ],
    )
    .part(2)
}

fn v0_16_to_0_17_part3() -> MigrationUnit {
    MigrationUnit::new(
        "0.16",
        "0.17",
        "Entity representation, UI transforms, audio volume arithmetic",
        vec![
            Rule::new(
                "entity-from-raw",
                "Entity::from_raw($INDEX)",
                "Entity::from_raw_u32($INDEX).unwrap()",
                "Entity::from_raw now takes a u32 and returns Option",
            ),
            Rule::new(
                "justify-text",
                "JustifyText",
                "Justify",
                "JustifyText renamed to Justify",
            ),
            Rule::new(
                "border-color",
                "BorderColor($COLOR)",
                "BorderColor::all($COLOR)",
                "BorderColor gained per-side values, use all()",
            ),
            Rule::new(
                "window-plugin-cursor",
                "WindowPlugin { $$$PRE, primary_window: $VAL, $$$POST }",
                "WindowPlugin { $$$PRE, primary_cursor_options: $VAL, $$$POST }",
                "primary_window renamed to primary_cursor_options",
            ),
            Rule::new(
                "timer-paused",
                "$TIMER.paused()",
                "$TIMER.is_paused()",
                "Timer::paused renamed to is_paused",
            ),
            Rule::new(
                "timer-finished",
                "$TIMER.finished()",
                "$TIMER.is_finished()",
                "Timer::finished renamed to is_finished",
            ),
            Rule::with_callback(
                "ui-transform",
                "Transform::from_xyz($X, $Y, $Z)",
                "ui_transform_note",
                "UI nodes use UiTransform instead of Transform",
            )
            .globs(&["**/ui/**/*.rs", "**/ui*.rs", "**/hud*.rs", "**/menu*.rs"]),
            Rule::with_callback(
                "volume-add",
                "$VOLUME + $PERCENT",
                "volume_add",
                "Volume arithmetic replaced by increase_by_percentage",
            )
            .globs(&["**/audio/**/*.rs", "**/audio*.rs", "**/sound*.rs"]),
            Rule::with_callback(
                "volume-sub",
                "$VOLUME - $PERCENT",
                "volume_sub",
                "Volume arithmetic replaced by decrease_by_percentage",
            )
            .globs(&["**/audio/**/*.rs", "**/audio*.rs", "**/sound*.rs"]),
        ],
    )
    .part(3)
}

fn v0_17_to_0_18() -> MigrationUnit {
    MigrationUnit::new(
        "0.17",
        "0.18",
        "Entity indices, hierarchy detach renames, feature flags",
        vec![
            Rule::new(
                "entity-row",
                "EntityRow",
                "EntityIndex",
                "EntityRow renamed to EntityIndex",
            ),
            Rule::new(
                "entity-row-method",
                "$ENTITY.row()",
                "$ENTITY.index()",
                "Entity::row renamed to index",
            ),
            Rule::new(
                "entity-from-row",
                "Entity::from_row",
                "Entity::from_index",
                "Entity::from_row renamed to from_index",
            ),
            Rule::new(
                "clear-children",
                "$ENTITY.clear_children()",
                "$ENTITY.detach_all_children()",
                "clear_children renamed to detach_all_children",
            ),
            Rule::new(
                "remove-children",
                "$ENTITY.remove_children",
                "$ENTITY.detach_children",
                "remove_children renamed to detach_children",
            ),
            Rule::new(
                "entity-not-spawned",
                "EntityDoesNotExistError",
                "EntityNotSpawnedError",
                "EntityDoesNotExistError renamed to EntityNotSpawnedError",
            ),
            Rule::new(
                "simple-executor",
                "SimpleExecutor",
                "SingleThreadedExecutor",
                "SimpleExecutor removed, use SingleThreadedExecutor",
            ),
            Rule::new(
                "reflect-bracket-attr",
                "#[reflect[$_]]",
                "#[reflect($_)]",
                "Bracketed reflect attribute form removed",
            ),
            Rule::new(
                "feature-animation",
                "features = [\"animation\"]",
                "features = [\"gltf_animation\"]",
                "animation feature renamed to gltf_animation",
            )
            .globs(&["Cargo.toml", "**/Cargo.toml"]),
            Rule::new(
                "feature-sprite-picking",
                "features = [\"bevy_sprite_picking_backend\"]",
                "features = [\"sprite_picking\"]",
                "Sprite picking feature renamed",
            )
            .globs(&["Cargo.toml", "**/Cargo.toml"]),
        ],
    )
}
