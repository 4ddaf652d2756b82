use std::sync::Arc;

use approx::assert_abs_diff_eq;
use glam::Vec3;
use vizij_skeletal_core::{
    AnimationError, AnimationLibrary, AnimationLibraryBuilder, AnimationPlayer, Bone,
    BoneChannel, BoneMaskBuilder, BoneSet, ClipSource, Config, Curve, Keyframe, LayerId,
    LayerTopologyBuilder, PlayOptions, Skeleton, Transform, WrapMode,
};

const ROOT: usize = 0;
const ARM: usize = 1;

fn mk_skeleton() -> Skeleton {
    Skeleton::new(vec![
        Bone::new("root", -1, Transform::IDENTITY),
        Bone::new(
            "arm",
            0,
            Transform::new(Vec3::new(0.0, 1.0, 0.0), Default::default(), Vec3::ONE),
        ),
    ])
    .unwrap()
}

fn translation(keys: &[(f32, Vec3)]) -> BoneChannel {
    BoneChannel {
        translation: Curve::new(keys.iter().map(|&(t, v)| Keyframe::new(t, v)).collect()),
        ..Default::default()
    }
}

fn constant(name: &str, wrap: WrapMode, root: Vec3) -> ClipSource {
    ClipSource::new(name, 1.0, wrap).channel("root", translation(&[(0.0, root)]))
}

fn mk_player() -> AnimationPlayer {
    mk_player_with(Config::default())
}

fn mk_player_with(config: Config) -> AnimationPlayer {
    let skeleton = mk_skeleton();
    let topology = LayerTopologyBuilder::new()
        .override_layer(LayerId::Base, None)
        .override_layer(LayerId::UpperBody, Some(BoneMaskBuilder::new().add("arm")))
        .additive_layer(LayerId::AdditiveBase, None)
        .build(&skeleton)
        .unwrap();
    let library: AnimationLibrary =
        AnimationLibraryBuilder::new(&skeleton, BoneSet::from_skeleton(&skeleton), topology)
            .clip(constant("idle", WrapMode::Loop, Vec3::new(1.0, 0.0, 0.0)))
            .clip(constant("run", WrapMode::Loop, Vec3::new(3.0, 0.0, 0.0)))
            .clip(constant("jump", WrapMode::Once, Vec3::new(2.0, 0.0, 0.0)))
            .clip(
                ClipSource::new("sweep", 1.0, WrapMode::Clamp).channel(
                    "root",
                    translation(&[(0.0, Vec3::ZERO), (1.0, Vec3::new(0.0, 0.0, 4.0))]),
                ),
            )
            .clip(
                ClipSource::new("wave", 1.0, WrapMode::Loop)
                    .on_layer(LayerId::UpperBody)
                    .channel("root", translation(&[(0.0, Vec3::splat(9.0))]))
                    .channel("arm", translation(&[(0.0, Vec3::new(0.0, 2.0, 0.0))])),
            )
            .build()
            .unwrap();
    AnimationPlayer::new(Arc::new(library), Arc::new(skeleton), config).unwrap()
}

fn instant() -> PlayOptions {
    PlayOptions::default().with_transition(0.0)
}

#[test]
fn replaying_the_active_clip_leaves_state_untouched() {
    let mut player = mk_player();
    player.play(LayerId::Base, "idle").unwrap();
    for _ in 0..3 {
        player.update_time(0.1);
    }
    let before = *player.override_state(0).unwrap();
    assert_eq!(before.playback.weight, 1.0);

    player.play(LayerId::Base, "idle").unwrap();
    assert_eq!(*player.override_state(0).unwrap(), before);
}

#[test]
fn first_play_fades_in_from_zero() {
    let mut player = mk_player();
    player
        .play_with(LayerId::Base, "idle", PlayOptions::default().with_transition(0.2))
        .unwrap();
    let state = player.override_state(0).unwrap();
    assert!(state.transition.is_none());
    assert_eq!(state.playback.weight, 0.0);

    player.update_time(0.1);
    let state = player.override_state(0).unwrap();
    assert_abs_diff_eq!(state.playback.weight, 0.5, epsilon = 1e-5);
    let root = player.sample_bone(ROOT);
    assert_abs_diff_eq!(root.translation.x, 0.5, epsilon = 1e-5);
}

#[test]
fn crossfade_is_halfway_at_half_the_transition() {
    let mut player = mk_player();
    player.play_with(LayerId::Base, "idle", instant()).unwrap();
    player.update_time(0.3);

    player
        .play_with(LayerId::Base, "run", PlayOptions::default().with_transition(0.2))
        .unwrap();
    let state = player.override_state(0).unwrap();
    let transition = state.transition.expect("switching clips snapshots the source");
    assert_abs_diff_eq!(transition.time, 0.3, epsilon = 1e-6);
    assert_eq!(state.playback.time, 0.0);

    player.update_time(0.1);
    let root = player.sample_bone(ROOT);
    assert_abs_diff_eq!(root.translation.x, 2.0, epsilon = 1e-4);

    let state = player.override_state(0).unwrap();
    let transition = state.transition.unwrap();
    assert_abs_diff_eq!(transition.time, 0.4, epsilon = 1e-6);
    assert_abs_diff_eq!(state.playback.time, 0.1, epsilon = 1e-6);

    player.update_time(0.15);
    assert!(player.override_state(0).unwrap().transition.is_none());
    assert_abs_diff_eq!(player.sample_bone(ROOT).translation.x, 3.0, epsilon = 1e-5);
}

#[test]
fn plain_play_uses_the_configured_transition() {
    let mut player = mk_player_with(Config {
        default_transition_seconds: 1.0,
        ..Config::default()
    });
    player.play_with(LayerId::Base, "idle", instant()).unwrap();
    player.update_time(0.1);

    player.play(LayerId::Base, "run").unwrap();
    let transition = player.override_state(0).unwrap().transition.unwrap();
    assert_eq!(transition.total_duration, 1.0);

    player.update_time(0.5);
    assert_abs_diff_eq!(player.sample_bone(ROOT).translation.x, 2.0, epsilon = 1e-4);
}

#[test]
fn zero_length_transition_switches_without_snapshot() {
    let mut player = mk_player();
    player.play_with(LayerId::Base, "idle", instant()).unwrap();
    player.play_with(LayerId::Base, "run", instant()).unwrap();
    assert!(player.override_state(0).unwrap().transition.is_none());
    assert_abs_diff_eq!(player.sample_bone(ROOT).translation.x, 3.0);
}

#[test]
fn once_clip_fades_out_after_reaching_its_end() {
    let mut player = mk_player();
    player.play_with(LayerId::Base, "jump", instant()).unwrap();
    player.update_time(0.5);
    player.update_time(0.6);

    let playback = player.override_state(0).unwrap().playback;
    assert_eq!(playback.time, 1.0);
    assert_eq!(playback.weight, 1.0);
    assert_eq!(playback.target_weight, 0.0);
    assert!(playback.weight_velocity < 0.0);
    assert_abs_diff_eq!(player.sample_bone(ROOT).translation.x, 2.0);

    player.update_time(0.1);
    let playback = player.override_state(0).unwrap().playback;
    assert_abs_diff_eq!(playback.weight, 1.0 - 0.1 / 0.15, epsilon = 1e-5);
    assert_eq!(playback.time, 1.0);

    player.update_time(0.1);
    let playback = player.override_state(0).unwrap().playback;
    assert_eq!(playback.clip, None);
    assert_eq!(playback.weight, 0.0);
    assert_eq!(player.sample_bone(ROOT), Transform::IDENTITY);
}

#[test]
fn stop_only_tightens_an_ongoing_fade() {
    let mut player = mk_player();
    player.play_with(LayerId::Base, "idle", instant()).unwrap();

    player.stop(LayerId::Base, 1.0).unwrap();
    assert_abs_diff_eq!(player.override_state(0).unwrap().playback.weight_velocity, -1.0);
    player.stop(LayerId::Base, 0.5).unwrap();
    assert_abs_diff_eq!(player.override_state(0).unwrap().playback.weight_velocity, -2.0);
    player.stop(LayerId::Base, 2.0).unwrap();
    assert_abs_diff_eq!(player.override_state(0).unwrap().playback.weight_velocity, -2.0);

    player.stop(LayerId::Base, 0.0).unwrap();
    assert_eq!(player.override_state(0).unwrap().playback.clip, None);
}

#[test]
fn fading_out_freezes_clip_time() {
    let mut player = mk_player();
    player.play_with(LayerId::Base, "idle", instant()).unwrap();
    player.update_time(0.2);
    player.stop(LayerId::Base, 1.0).unwrap();
    player.update_time(0.3);

    let playback = player.override_state(0).unwrap().playback;
    assert_abs_diff_eq!(playback.time, 0.2, epsilon = 1e-6);
    assert_abs_diff_eq!(playback.weight, 0.7, epsilon = 1e-6);
}

#[test]
fn same_clip_retargets_weight_without_restarting() {
    let mut player = mk_player();
    player.play_with(LayerId::Base, "idle", instant()).unwrap();
    player.update_time(0.4);

    player
        .play_with(
            LayerId::Base,
            "idle",
            PlayOptions::default().with_weight(0.5).with_transition(0.5),
        )
        .unwrap();
    let state = player.override_state(0).unwrap();
    assert!(state.transition.is_none());
    assert_abs_diff_eq!(state.playback.time, 0.4, epsilon = 1e-6);
    assert_abs_diff_eq!(state.playback.weight_velocity, -1.0);

    player.update_time(0.25);
    assert_abs_diff_eq!(
        player.override_state(0).unwrap().playback.weight,
        0.75,
        epsilon = 1e-6
    );
}

#[test]
fn reverse_playback_starts_at_the_end_and_loops_backwards() {
    let mut player = mk_player();
    player
        .play_with(LayerId::Base, "sweep", instant().with_speed(-1.0))
        .unwrap();
    assert_eq!(player.override_state(0).unwrap().playback.time, 1.0);
    assert_abs_diff_eq!(player.sample_bone(ROOT).translation.z, 4.0, epsilon = 1e-6);

    player.update_time(0.25);
    assert_abs_diff_eq!(player.sample_bone(ROOT).translation.z, 3.0, epsilon = 1e-5);

    player
        .play_with(LayerId::Base, "idle", instant().with_speed(-1.0))
        .unwrap();
    player.update_time(0.25);
    player.update_time(1.0);
    assert_abs_diff_eq!(
        player.override_state(0).unwrap().playback.time,
        0.75,
        epsilon = 1e-5
    );
}

#[test]
fn masked_layer_only_touches_its_bones() {
    let mut player = mk_player();
    player.play_with(LayerId::Base, "idle", instant()).unwrap();
    player.play_default("wave", instant()).unwrap();
    player.update_time(0.1);

    assert_eq!(
        player.override_state(1).unwrap().playback.clip,
        player.library().clip_id("wave")
    );
    assert_abs_diff_eq!(player.sample_bone(ROOT).translation.x, 1.0);
    let arm = player.sample_bone(ARM);
    assert!(arm.translation.abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-6));
}

#[test]
fn clip_without_channel_pulls_toward_bind() {
    let mut player = mk_player();
    player.play_with(LayerId::Base, "idle", instant()).unwrap();
    let arm = player.sample_bone(ARM);
    assert_eq!(arm, player.skeleton().bone(ARM).unwrap().local_bind);
}

#[test]
fn unknown_names_are_reported() {
    let mut player = mk_player();
    let err = player.play(LayerId::Base, "moonwalk").unwrap_err();
    assert_eq!(
        err,
        AnimationError::UnknownClip {
            name: "moonwalk".into()
        }
    );
    let err = player.play(LayerId::Head, "idle").unwrap_err();
    assert_eq!(err, AnimationError::UnknownLayer { layer: LayerId::Head });
    let err = player.stop(LayerId::Head, 0.1).unwrap_err();
    assert_eq!(err.category(), "config");
}

#[test]
fn stop_all_fades_every_layer() {
    let mut player = mk_player();
    player.play_with(LayerId::Base, "idle", instant()).unwrap();
    player.play_with(LayerId::UpperBody, "wave", instant()).unwrap();
    player.stop_all(0.5);
    for i in 0..2 {
        let playback = player.override_state(i).unwrap().playback;
        assert_eq!(playback.target_weight, 0.0);
        assert_abs_diff_eq!(playback.weight_velocity, -2.0);
    }
    player.update_time(0.5);
    assert!(player.override_state(0).unwrap().playback.clip.is_none());
    assert!(player.override_state(1).unwrap().playback.clip.is_none());
}
