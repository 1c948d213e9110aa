use std::path::Path;

use thiep::{Compositor, LoadedFont, Rgba8, Surface, TemplateRegistry, asset};

fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn digest_u64(bytes: &[u8]) -> u64 {
    let mut state = 0x9E37_79B9_7F4A_7C15u64;
    for chunk in bytes.chunks(8) {
        let mut v = 0u64;
        for (i, &b) in chunk.iter().enumerate() {
            v |= (b as u64) << (i * 8);
        }
        state = mix64(state ^ v);
    }
    state
}

fn compositor() -> Compositor {
    let font = LoadedFont::from_path(
        "DejaVu Serif",
        Path::new("assets/fonts/DejaVuSerif-Italic.ttf"),
    )
    .unwrap();
    Compositor::new(font)
}

/// Pixels within one step of `color` per channel, as (x, y) positions.
fn positions_near(surface: &Surface, color: Rgba8) -> Vec<(u32, u32)> {
    let mut out = Vec::new();
    for y in 0..surface.height() {
        for x in 0..surface.width() {
            let p = surface.pixel(x, y).unwrap();
            if p[0].abs_diff(color.r) <= 1 && p[1].abs_diff(color.g) <= 1 && p[2].abs_diff(color.b) <= 1
            {
                out.push((x, y));
            }
        }
    }
    out
}

fn bare_template_surface(asset_ref: &str) -> Surface {
    let prepared = asset::load_image(Path::new("assets/templates"), asset_ref).unwrap();
    Surface::from_rgba8(prepared.width, prepared.height, prepared.rgba8.as_ref().clone()).unwrap()
}

#[test]
fn hanoi_renders_left_aligned_name_in_template_color() {
    let registry = TemplateRegistry::builtin();
    let hanoi = registry.resolve("hanoi").unwrap();
    let prepared = asset::load_image(Path::new("assets/templates"), &hanoi.asset_ref).unwrap();

    let surface = compositor()
        .compose(&prepared, hanoi, "Nguyễn Văn A")
        .unwrap();

    // Native dimensions, never letterboxed or pre-scaled.
    assert_eq!(surface.width(), prepared.width);
    assert_eq!(surface.height(), prepared.height);

    // The bare template carries no pixel near the fill color, the composed
    // surface does.
    let bare = bare_template_surface(&hanoi.asset_ref);
    assert!(positions_near(&bare, hanoi.color).is_empty());

    let drawn = positions_near(&surface, hanoi.color);
    assert!(!drawn.is_empty(), "expected glyph pixels in #c5918a");

    // Left-aligned at x=100, anchored at y = round(0.417 * height).
    let anchor = Compositor::anchor_point(hanoi, surface.width(), surface.height());
    let min_x = drawn.iter().map(|&(x, _)| x).min().unwrap();
    assert!(min_x >= 80, "ink starts near the x=100 anchor, got {min_x}");
    for &(_, y) in &drawn {
        assert!(
            (f64::from(y) - anchor.y).abs() <= 60.0,
            "ink row {y} strayed from anchor row {}",
            anchor.y
        );
    }
}

#[test]
fn dongnai_renders_centered_name_in_template_color() {
    let registry = TemplateRegistry::builtin();
    let dongnai = registry.resolve("dongnai").unwrap();
    let prepared = asset::load_image(Path::new("assets/templates"), &dongnai.asset_ref).unwrap();

    let surface = compositor().compose(&prepared, dongnai, "Trần Thị B").unwrap();
    assert_eq!(surface.width(), prepared.width);
    assert_eq!(surface.height(), prepared.height);

    let bare = bare_template_surface(&dongnai.asset_ref);
    assert!(positions_near(&bare, dongnai.color).is_empty());

    let drawn = positions_near(&surface, dongnai.color);
    assert!(!drawn.is_empty(), "expected glyph pixels in #69622c");

    // Centered on width/2: the ink's horizontal midpoint sits near it.
    let min_x = drawn.iter().map(|&(x, _)| x).min().unwrap();
    let max_x = drawn.iter().map(|&(x, _)| x).max().unwrap();
    let mid = f64::from(min_x + max_x) / 2.0;
    let center = f64::from(surface.width()) / 2.0;
    assert!(
        (mid - center).abs() <= 40.0,
        "ink midpoint {mid} too far from center {center}"
    );
}

#[test]
fn composition_is_deterministic_across_fresh_loads() {
    let registry = TemplateRegistry::builtin();
    let hanoi = registry.resolve("hanoi").unwrap();
    let compositor = compositor();

    let a = {
        let prepared = asset::load_image(Path::new("assets/templates"), &hanoi.asset_ref).unwrap();
        compositor.compose(&prepared, hanoi, "Nguyễn Văn A").unwrap()
    };
    let b = {
        let prepared = asset::load_image(Path::new("assets/templates"), &hanoi.asset_ref).unwrap();
        compositor.compose(&prepared, hanoi, "Nguyễn Văn A").unwrap()
    };

    assert_eq!(digest_u64(a.rgba8()), digest_u64(b.rgba8()));
    assert!(a.rgba8().iter().any(|&x| x != 0));
}
