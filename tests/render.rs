use cairo::{Context, Format, ImageSurface};
use panelshot::draw::{self, Color, ImageSet};
use panelshot::scene::{Scene, prepare_for_capture};

const SCENE: &str = r#"{
  "root": {
    "bounds": { "width": 200, "height": 100 },
    "kind": { "type": "container" },
    "children": [
      {
        "key": "result-panel",
        "bounds": { "x": 20, "y": 10, "width": 100, "height": 40 },
        "kind": { "type": "container", "background": { "r": 0.0, "g": 0.0, "b": 1.0 } },
        "children": [
          {
            "bounds": { "x": 0, "y": 0, "width": 50, "height": 40 },
            "kind": { "type": "container", "background": { "r": 1.0, "g": 0.0, "b": 0.0 } },
            "marks": { "exclude_from_export": true }
          },
          {
            "bounds": { "x": 0, "y": 30, "width": 100, "height": 10 },
            "kind": {
              "type": "bar",
              "value": 0.5,
              "fill": { "r": 0.0, "g": 1.0, "b": 0.0 },
              "track": { "r": 0.0, "g": 0.0, "b": 0.0 }
            }
          }
        ]
      }
    ]
  }
}"#;

fn pixel(surface: &mut ImageSurface, x: usize, y: usize) -> [u8; 4] {
    let stride = surface.stride() as usize;
    let data = surface.data().unwrap();
    let offset = y * stride + x * 4;
    [data[offset], data[offset + 1], data[offset + 2], data[offset + 3]]
}

fn render(scene: &Scene) -> ImageSurface {
    let target = scene.find("result-panel").unwrap();
    let prepared = prepare_for_capture(target);
    assert_eq!((prepared.width, prepared.height), (100.0, 40.0));

    let surface =
        ImageSurface::create(Format::ARgb32, prepared.width as i32, prepared.height as i32)
            .unwrap();
    {
        let ctx = Context::new(&surface).unwrap();
        draw::render_background(&ctx, Color::new(1.0, 1.0, 1.0, 1.0));
        draw::render_node(&ctx, &prepared.root, &ImageSet::new());
    }
    surface
}

#[test]
fn prepared_target_renders_without_excluded_nodes() {
    let scene = Scene::from_json(SCENE).unwrap();
    let mut surface = render(&scene);
    surface.flush();

    // ARGB32 is stored as BGRA on little-endian machines.
    let overlay_area = pixel(&mut surface, 10, 10);
    assert_eq!(overlay_area, [255, 0, 0, 255], "excluded overlay was painted");

    let filled_bar = pixel(&mut surface, 10, 35);
    assert_eq!(filled_bar, [0, 255, 0, 255]);

    let bar_track = pixel(&mut surface, 90, 35);
    assert_eq!(bar_track, [0, 0, 0, 255]);
}

#[test]
fn rendering_leaves_scene_untouched() {
    let scene = Scene::from_json(SCENE).unwrap();
    let before = scene.clone();
    let _ = render(&scene);
    assert_eq!(scene, before);
    assert!(scene.find("result-panel").unwrap().children[0].marks.exclude_from_export);
}
