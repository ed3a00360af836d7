use glam::Vec2;
use pose2d::{PullSolver, Skeleton, SkeletonData, SolverConfig};
use serde_json::json;
use std::path::PathBuf;

fn main() {
    env_logger::init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut positional = Vec::<String>::new();
    let mut config = SolverConfig::default();

    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--conduction" => {
                if let Some(value) = args.get(i + 1).and_then(|v| v.parse().ok()) {
                    config = config.with_conduction(value);
                }
                i += 2;
            }
            "--substeps" => {
                if let Some(value) = args.get(i + 1).and_then(|v| v.parse().ok()) {
                    config = config.with_substeps(value);
                }
                i += 2;
            }
            other => {
                positional.push(other.to_string());
                i += 1;
            }
        }
    }

    let Some(json_path) = positional.first().map(PathBuf::from) else {
        eprintln!(
            "usage: drag_dump <skeleton.json> <bone> <dx> <dy> [pull_pos] [--conduction c] [--substeps n]"
        );
        std::process::exit(2);
    };
    let bone_name = positional.get(1).cloned().unwrap_or_default();
    let number = |index: usize, default: f32| -> f32 {
        positional
            .get(index)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    };
    let pull = Vec2::new(number(2, 0.0), number(3, 0.0));
    let pull_pos = number(4, 1.0).clamp(0.0, 1.0);

    let json = std::fs::read_to_string(&json_path).expect("read json");
    let data = SkeletonData::from_json_str(&json).expect("parse json");
    let mut skeleton = Skeleton::new(data.clone());

    let bone = skeleton
        .find_bone(&bone_name)
        .unwrap_or_else(|| panic!("unknown bone '{bone_name}'"));

    let (top, deltas, rotations) = {
        let mut solver = PullSolver::new(&skeleton, bone, config).expect("build solver");
        solver.pull(bone, pull, pull_pos);
        (
            solver.top_bone(),
            solver.rotation_differences(),
            solver.next_rotations(),
        )
    };
    skeleton
        .set_rotations(top, &rotations)
        .expect("apply rotations");

    let bones = skeleton
        .bones
        .iter()
        .map(|b| {
            json!({
                "name": data.bones[b.data_index()].name,
                "rotate": b.rotate.to_degrees(),
                "worldX": b.world_x,
                "worldY": b.world_y,
                "worldRotation": b.world_angle.to_degrees(),
            })
        })
        .collect::<Vec<_>>();

    let out = json!({
        "bone": bone_name,
        "pull": [pull.x, pull.y],
        "pullPos": pull_pos,
        "deltas": deltas.iter().map(|d| d.to_degrees()).collect::<Vec<_>>(),
        "bones": bones,
    });
    println!("{}", serde_json::to_string_pretty(&out).expect("serialize"));
}
