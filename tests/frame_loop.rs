//! Frame loop behaviour without a GPU: input in, FrameData out.

use cgmath::Vector4;
use stagelight::frame::render_passes;
use stagelight::gfx::camera::fps_camera::FLOOR_HEIGHT;
use stagelight::gfx::rendering::compute_light_space_matrix;
use stagelight::gfx::scene::animation::GATE_CLOSED;
use stagelight::gfx::scene::audience::JUMP_HEIGHT_MAX;
use stagelight::gfx::scene::{ObjectId, Scene};
use stagelight::input::InputState;
use stagelight::{AppConfig, FrameData, FrameOrchestrator, FrameTiming, RenderPasses};
use winit::event::ElementState;
use winit::keyboard::{KeyCode, PhysicalKey};

const TIMING: FrameTiming = FrameTiming {
    delta: 1.0 / 60.0,
    elapsed: 0.0,
};

fn orchestrator() -> FrameOrchestrator {
    FrameOrchestrator::new(Scene::new(&AppConfig::default()))
}

fn tap(orchestrator: &mut FrameOrchestrator, input: &mut InputState, code: KeyCode) -> FrameData {
    input.process_key(PhysicalKey::Code(code), ElementState::Pressed);
    let frame = orchestrator.advance(input, TIMING);
    input.end_frame();
    input.process_key(PhysicalKey::Code(code), ElementState::Released);
    frame
}

fn run_frames(orchestrator: &mut FrameOrchestrator, input: &mut InputState, frames: usize) -> FrameData {
    let mut last = orchestrator.advance(input, TIMING);
    input.end_frame();
    for _ in 1..frames {
        last = orchestrator.advance(input, TIMING);
        input.end_frame();
    }
    last
}

fn transform_of(frame: &FrameData, id: ObjectId) -> cgmath::Matrix4<f32> {
    frame
        .objects
        .iter()
        .find(|object| object.id == id)
        .map(|object| object.model)
        .unwrap_or_else(|| panic!("{id:?} missing from frame"))
}

#[test]
fn disabled_animations_keep_every_transform_still() {
    let mut orchestrator = orchestrator();
    let mut input = InputState::new();

    let first = run_frames(&mut orchestrator, &mut input, 1);
    let later = run_frames(&mut orchestrator, &mut input, 30);

    assert_eq!(first.objects, later.objects);
    assert_eq!(orchestrator.scene().animation.gates.left.angle(), GATE_CLOSED);
}

#[test]
fn stopping_animations_closes_the_gates_but_keeps_the_disco_ball() {
    let mut orchestrator = orchestrator();
    let mut input = InputState::new();

    tap(&mut orchestrator, &mut input, KeyCode::KeyQ);
    run_frames(&mut orchestrator, &mut input, 40);
    let gates = orchestrator.scene().animation.gates;
    assert!(gates.left.angle() < GATE_CLOSED);
    let disco = orchestrator.scene().animation.disco_ball.angle();
    assert!(disco > 0.0);

    tap(&mut orchestrator, &mut input, KeyCode::KeyE);
    let frame = run_frames(&mut orchestrator, &mut input, 1);
    let gates = orchestrator.scene().animation.gates;
    assert_eq!(gates.left.angle(), GATE_CLOSED);
    assert_eq!(gates.right.angle(), GATE_CLOSED);
    assert_eq!(orchestrator.scene().animation.disco_ball.angle(), disco);
    assert_eq!(
        transform_of(&frame, ObjectId::DiscoBall),
        orchestrator.scene().animation.disco_ball.transform()
    );
}

#[test]
fn fog_density_stays_within_bounds() {
    let mut orchestrator = orchestrator();
    let mut input = InputState::new();

    input.process_key(PhysicalKey::Code(KeyCode::KeyG), ElementState::Pressed);
    let frame = run_frames(&mut orchestrator, &mut input, 50);
    assert_eq!(frame.fog_density, 0.0);
    input.process_key(PhysicalKey::Code(KeyCode::KeyG), ElementState::Released);

    orchestrator.scene_mut().settings.set_fog_density(0.9995);
    input.process_key(PhysicalKey::Code(KeyCode::KeyF), ElementState::Pressed);
    let frame = run_frames(&mut orchestrator, &mut input, 5);
    assert_eq!(frame.fog_density, 1.0);
}

#[test]
fn walking_forward_never_drops_below_the_floor() {
    let mut orchestrator = orchestrator();
    let mut input = InputState::new();

    input.process_key(PhysicalKey::Code(KeyCode::KeyW), ElementState::Pressed);
    for _ in 0..200 {
        let frame = orchestrator.advance(&input, TIMING);
        input.end_frame();
        assert!(frame.camera_position.y >= FLOOR_HEIGHT);
    }
}

#[test]
fn audience_jumps_stay_between_floor_and_ceiling() {
    let mut orchestrator = orchestrator();
    let mut input = InputState::new();

    tap(&mut orchestrator, &mut input, KeyCode::KeyQ);
    for _ in 0..300 {
        orchestrator.advance(&input, TIMING);
        input.end_frame();
        for member in orchestrator.scene().animation.audience.members() {
            assert!(member.height() >= member.floor());
            assert!(member.height() <= member.floor() + JUMP_HEIGHT_MAX);
        }
    }
}

#[test]
fn light_space_matrix_is_deterministic_and_follows_the_light() {
    let mut orchestrator = orchestrator();
    let mut input = InputState::new();

    let a = run_frames(&mut orchestrator, &mut input, 1);
    let b = run_frames(&mut orchestrator, &mut input, 1);
    assert_eq!(a.light_space, b.light_space);

    let scene = orchestrator.scene();
    let expected = compute_light_space_matrix(scene.light.shadow_eye(), scene.camera.target());
    assert_eq!(b.light_space, expected);

    input.process_key(PhysicalKey::Code(KeyCode::KeyJ), ElementState::Pressed);
    let rotated = run_frames(&mut orchestrator, &mut input, 10);
    assert_ne!(rotated.light_space, a.light_space);
    assert_ne!(rotated.light_direction, a.light_direction);
}

fn assert_inside_light_frustum(frame: &FrameData) {
    for object in &frame.objects {
        let clip = frame.light_space * object.model * Vector4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(
            (-1.0..=1.0).contains(&ndc.x) && (-1.0..=1.0).contains(&ndc.y),
            "{:?} outside the light frustum: {ndc:?}",
            object.id
        );
        assert!((0.0..=1.0).contains(&ndc.z), "{:?} has light depth {}", object.id, ndc.z);
    }
}

#[test]
fn every_object_lands_inside_the_shadow_map() {
    let mut orchestrator = orchestrator();
    let mut input = InputState::new();

    assert_inside_light_frustum(&run_frames(&mut orchestrator, &mut input, 1));

    tap(&mut orchestrator, &mut input, KeyCode::KeyQ);
    input.process_key(PhysicalKey::Code(KeyCode::KeyJ), ElementState::Pressed);
    for _ in 0..24 {
        let frame = run_frames(&mut orchestrator, &mut input, 30);
        assert_inside_light_frustum(&frame);
    }
}

#[derive(Default)]
struct PassLog(Vec<&'static str>);

impl RenderPasses for PassLog {
    fn depth_pass(&mut self, _frame: &FrameData) {
        self.0.push("depth");
    }
    fn depth_map_preview(&mut self, _frame: &FrameData) {
        self.0.push("preview");
    }
    fn main_pass(&mut self, _frame: &FrameData) {
        self.0.push("main");
    }
}

#[test]
fn depth_preview_replaces_the_main_pass_until_toggled_back() {
    let mut orchestrator = orchestrator();
    let mut input = InputState::new();
    let mut passes = PassLog::default();

    let frame = tap(&mut orchestrator, &mut input, KeyCode::KeyM);
    render_passes(&mut passes, &frame);
    let frame = run_frames(&mut orchestrator, &mut input, 1);
    render_passes(&mut passes, &frame);
    let frame = tap(&mut orchestrator, &mut input, KeyCode::KeyM);
    render_passes(&mut passes, &frame);

    assert_eq!(passes.0, ["depth", "preview", "depth", "preview", "depth", "main"]);
}

#[test]
fn escape_requests_quit() {
    let mut orchestrator = orchestrator();
    let mut input = InputState::new();

    assert!(!run_frames(&mut orchestrator, &mut input, 1).quit_requested);
    assert!(tap(&mut orchestrator, &mut input, KeyCode::Escape).quit_requested);
}
