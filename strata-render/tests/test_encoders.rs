use rstest::rstest;
use strata_render::marks::group::{Clip, SceneGroup};
use strata_render::marks::rect::SceneRectMark;
use strata_render::marks::rule::SceneRuleMark;
use strata_render::marks::text::SceneTextMark;
use strata_render::types::TextAlign;
use strata_render::{encode, write, ImageFormat, RenderConfig, SceneGraph, StrataRenderError};

fn sample_scene() -> SceneGraph {
    let mut scene = SceneGraph::new(160.0, 120.0);
    scene.marks.push(
        SceneGroup {
            name: "panel".to_string(),
            origin: [20.0, 10.0],
            clip: Clip::Rect {
                x: 0.0,
                y: 0.0,
                width: 120.0,
                height: 90.0,
            },
            marks: vec![
                SceneRectMark {
                    len: 3,
                    x: vec![0.0, 40.0, 80.0].into(),
                    y: 30.0f32.into(),
                    width: 40.0f32.into(),
                    height: 60.0f32.into(),
                    fill: vec![
                        [0.2, 0.3, 0.6, 1.0],
                        [0.4, 0.6, 0.2, 1.0],
                        [0.9, 0.1, 0.1, 0.5],
                    ]
                    .into(),
                    ..Default::default()
                }
                .into(),
                SceneRuleMark {
                    x2: 120.0f32.into(),
                    ..Default::default()
                }
                .into(),
            ],
            zindex: None,
        }
        .into(),
    );
    scene.marks.push(
        SceneTextMark {
            text: "density".to_string().into(),
            x: 80.0f32.into(),
            y: 115.0f32.into(),
            align: TextAlign::Center.into(),
            ..Default::default()
        }
        .into(),
    );
    scene
}

#[test]
fn test_png_dimensions() {
    let bytes = encode(&sample_scene(), ImageFormat::Png, &RenderConfig::default()).unwrap();
    let img = image::load_from_memory(&bytes).unwrap();
    assert_eq!((img.width(), img.height()), (160, 120));

    let bytes = encode(&sample_scene(), ImageFormat::Png, &RenderConfig { scale: 2.0 }).unwrap();
    let img = image::load_from_memory(&bytes).unwrap();
    assert_eq!((img.width(), img.height()), (320, 240));
}

#[test]
fn test_png_draws_bars() {
    let bytes = encode(&sample_scene(), ImageFormat::Png, &RenderConfig::default()).unwrap();
    let img = image::load_from_memory(&bytes).unwrap().to_rgba8();
    // inside the first bar
    let px = img.get_pixel(40, 70);
    assert!(px[2] > px[0], "expected a blue pixel, got {px:?}");
    // background is white
    assert_eq!(img.get_pixel(2, 2).0, [255, 255, 255, 255]);
}

#[rstest]
#[case(ImageFormat::Svg, b"<svg".as_slice())]
#[case(ImageFormat::Pdf, b"%PDF-".as_slice())]
#[case(ImageFormat::Eps, b"%!PS-Adobe-3.0 EPSF-3.0".as_slice())]
#[case(ImageFormat::Ps, b"%!PS-Adobe-3.0".as_slice())]
#[case(ImageFormat::Png, b"\x89PNG".as_slice())]
fn test_signatures(#[case] format: ImageFormat, #[case] magic: &[u8]) {
    let bytes = encode(&sample_scene(), format, &RenderConfig::default()).unwrap();
    assert!(bytes.starts_with(magic));
}

#[test]
fn test_zero_size_rejected() {
    let scene = SceneGraph::new(0.0, 100.0);
    assert!(matches!(
        encode(&scene, ImageFormat::Svg, &RenderConfig::default()),
        Err(StrataRenderError::InvalidSize { .. })
    ));
}

#[test]
fn test_write_infers_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("figure.eps");
    let format = write(&sample_scene(), &path, &RenderConfig::default()).unwrap();
    assert_eq!(format, ImageFormat::Eps);
    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("%%BoundingBox: 0 0 160 120"));

    let err = write(&sample_scene(), &dir.path().join("figure"), &RenderConfig::default());
    assert!(matches!(err, Err(StrataRenderError::UnsupportedFormat(_))));
}

#[test]
fn test_scene_round_trips_through_json() {
    let scene = sample_scene();
    let json = serde_json::to_string(&scene).unwrap();
    let parsed: SceneGraph = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, scene);
    assert_eq!(parsed.texts(), vec!["density".to_string()]);
}
