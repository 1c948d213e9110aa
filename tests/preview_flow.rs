use std::fs;
use std::path::Path;

use thiep::{
    CompositionRequest, Compositor, DownloadChannel, Exporter, LoadedFont, PreviewController,
    PreviewState, TemplateRegistry,
};

fn controller() -> PreviewController {
    let font = LoadedFont::from_path(
        "DejaVu Serif",
        Path::new("assets/fonts/DejaVuSerif-Italic.ttf"),
    )
    .unwrap();
    PreviewController::new(
        TemplateRegistry::builtin(),
        Compositor::new(font),
        "assets/templates",
    )
}

#[test]
fn input_changes_republish_and_template_switches_change_dimensions() {
    let mut c = controller();
    assert_eq!(c.state(), PreviewState::Idle);

    let hanoi = CompositionRequest::new("hanoi", "Nguyễn Văn A").unwrap();
    let first = c.on_input_changed(&hanoi).unwrap();
    assert_eq!(c.state(), PreviewState::Ready);

    // Name change: same dimensions, different pixels.
    let renamed = CompositionRequest::new("hanoi", "Nguyễn Văn B").unwrap();
    let second = c.on_input_changed(&renamed).unwrap();
    assert_eq!(second.width(), first.width());
    assert_ne!(second.rgba8(), first.rgba8());

    // Template change: the published surface follows the new asset's
    // native dimensions.
    let dongnai = CompositionRequest::new("dongnai", "Nguyễn Văn B").unwrap();
    let third = c.on_input_changed(&dongnai).unwrap();
    assert_ne!((third.width(), third.height()), (first.width(), first.height()));
    assert_eq!(
        c.published_surface().unwrap().rgba8(),
        third.rgba8(),
        "published surface is the newest composition"
    );
}

#[test]
fn ready_state_supports_repeat_downloads_of_the_same_surface() {
    let mut c = controller();
    let request = CompositionRequest::new("dongnai", "Trần Thị B").unwrap();
    c.on_input_changed(&request).unwrap();

    let dir = std::env::temp_dir().join(format!("thiep-test-{}-repeat", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();

    let mut exporter = Exporter::new(vec![Box::new(DownloadChannel::new(&dir))]);

    let first = c.on_export_requested(&mut exporter).unwrap();
    assert!(first.success);
    assert_eq!(c.state(), PreviewState::Ready);

    let bytes_a = fs::read(dir.join("thiep_Trần_Thị_B.png")).unwrap();

    let second = c.on_export_requested(&mut exporter).unwrap();
    assert!(second.success);
    let bytes_b = fs::read(dir.join("thiep_Trần_Thị_B.png")).unwrap();
    assert_eq!(bytes_a, bytes_b, "repeat export of an immutable surface");

    let _ = fs::remove_dir_all(&dir);
}
