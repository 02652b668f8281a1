use float_cmp::approx_eq;
use proptest::prelude::*;

use widget_svg::{Bounds, Document, RenderOverrides, Session, TransformList};

fn load(source: &str) -> Document {
    Document::parse_with_session(source, Session::new_for_test_suite()).unwrap()
}

fn bounds(source: &str) -> Bounds {
    load(source)
        .render(None, &RenderOverrides::default())
        .unwrap()
        .bounds()
}

fn same_bounds(a: Bounds, b: Bounds) -> bool {
    approx_eq!(f64, a.xmin, b.xmin, epsilon = 1e-6)
        && approx_eq!(f64, a.xmax, b.xmax, epsilon = 1e-6)
        && approx_eq!(f64, a.ymin, b.ymin, epsilon = 1e-6)
        && approx_eq!(f64, a.ymax, b.ymax, epsilon = 1e-6)
}

proptest! {
    #[test]
    fn relative_and_absolute_paths_agree(
        points in prop::collection::vec((-1000i32..1000, -1000i32..1000), 2..12)
    ) {
        let mut absolute = String::new();
        let mut relative = String::new();
        let mut prev = (0, 0);

        for (i, &(x, y)) in points.iter().enumerate() {
            let (abs_cmd, rel_cmd) = if i == 0 { ("M", "m") } else { ("L", "l") };

            absolute.push_str(&format!("{abs_cmd} {x} {y} "));
            relative.push_str(&format!("{rel_cmd} {} {} ", x - prev.0, y - prev.1));
            prev = (x, y);
        }

        let a = load(&format!(r#"<svg><path d="{absolute}"/></svg>"#))
            .render(None, &RenderOverrides::default())
            .unwrap();
        let r = load(&format!(r#"<svg><path d="{relative}"/></svg>"#))
            .render(None, &RenderOverrides::default())
            .unwrap();

        prop_assert_eq!(a, r);
    }

    #[test]
    fn nested_transforms_compose(
        tx in -100.0f64..100.0,
        ty in -100.0f64..100.0,
        angle in -180.0f64..180.0,
        s in 0.1f64..10.0,
    ) {
        let nested = bounds(&format!(
            r#"<svg><g transform="translate({tx} {ty})"><g transform="rotate({angle})"><rect transform="scale({s})" x="1" y="2" width="3" height="4"/></g></g></svg>"#
        ));
        let flat = bounds(&format!(
            r#"<svg><rect transform="translate({tx} {ty}) rotate({angle}) scale({s})" x="1" y="2" width="3" height="4"/></svg>"#
        ));

        prop_assert!(same_bounds(nested, flat), "{:?} != {:?}", nested, flat);
    }

    #[test]
    fn transform_lists_collapse_to_the_same_matrix(
        tx in -100.0f64..100.0,
        angle in -180.0f64..180.0,
        cx in -10.0f64..10.0,
    ) {
        let t = transform_attribute(&format!("translate({tx}) rotate({angle} {cx} 0)"))
            .to_transform();

        let doc = load(&format!(
            r#"<svg><circle transform="translate({tx}) rotate({angle} {cx} 0)" cx="5" cy="5" r="0"/></svg>"#
        ));
        let b = doc.render(None, &RenderOverrides::default()).unwrap().bounds();

        let (x, y) = t.transform_point(5.0, 5.0);
        prop_assert!(approx_eq!(f64, b.xmin, x, epsilon = 1e-6));
        prop_assert!(approx_eq!(f64, b.ymin, y, epsilon = 1e-6));
    }

    #[test]
    fn renders_are_repeatable(dx in -50.0f64..50.0, phi in -3.0f64..3.0) {
        let doc = load(include_str!("fixtures/slider.svg"));

        let mut overrides = RenderOverrides::default();
        overrides.displacement_by_id.insert(
            "thumb".to_string(),
            widget_svg::Displacement { dx, phi, ..Default::default() },
        );

        let first = doc.render(None, &overrides).unwrap();
        let second = doc.render(None, &overrides).unwrap();
        prop_assert_eq!(first, second);
    }
}

/// Parses a `transform` attribute through a document, the only public way in.
fn transform_attribute(value: &str) -> TransformList {
    let doc = load(&format!(r#"<svg><g id="g" transform="{value}"/></svg>"#));
    let node = doc.element_by_id("g").unwrap();
    let list = node.borrow().transform.clone();
    list
}
