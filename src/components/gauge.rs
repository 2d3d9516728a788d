use dioxus::prelude::*;

/// Angles are in degrees, measured clockwise from the bottom of the dial.
const ANGLE_OFFSET: f32 = 90.0;

fn polar(c: f32, r: f32, deg: f32) -> (f32, f32) {
    let rad = (deg + ANGLE_OFFSET).to_radians();
    (c + r * rad.cos(), c + r * rad.sin())
}

/// SVG path of the arc from `a0` to `a1` on a circle centred at `(c, c)`.
fn arc_path(c: f32, r: f32, a0: f32, a1: f32) -> String {
    let (x0, y0) = polar(c, r, a0);
    let (x1, y1) = polar(c, r, a1);
    let large_arc = u8::from((a1 - a0).abs() >= 180.0);
    let sweep = u8::from(a1 >= a0);
    format!("M {x0:.3} {y0:.3} A {r:.3} {r:.3} 0 {large_arc} {sweep} {x1:.3} {y1:.3}")
}

/// Angle reached by `percent` along the dial.
fn end_angle(percent: i32, start_angle: f32, stop_angle: f32) -> f32 {
    let span = (stop_angle - start_angle).abs().max(0.0001);
    start_angle + span * (percent.clamp(0, 100) as f32 / 100.0)
}

/// Open dial filled to `value` percent, with arbitrary content in the middle.
#[allow(non_snake_case)]
#[component]
pub fn Gauge(
    value: i32,
    start_angle: f32,
    stop_angle: f32,
    size: i32,
    stroke: i32,
    track_class: String,
    progress_class: String,
    children: Element,
) -> Element {
    let c = size as f32 / 2.0;
    let r = c - stroke as f32 / 2.0 - 1.0;
    let track_d = arc_path(c, r, start_angle, stop_angle);
    let progress_d = arc_path(c, r, start_angle, end_angle(value, start_angle, stop_angle));

    rsx! {
        div { class: "gauge", style: "width:{size}px;height:{size}px",
            svg { width: "{size}", height: "{size}", view_box: "0 0 {size} {size}",
                path { class: "{track_class}", d: "{track_d}", fill: "none", stroke: "currentColor", stroke_width: "{stroke}", stroke_linecap: "round" }
                if value > 0 {
                    path { class: "{progress_class}", d: "{progress_d}", fill: "none", stroke: "currentColor", stroke_width: "{stroke}", stroke_linecap: "round" }
                }
            }
            div { class: "gauge-center", {children} }
        }
    }
}
