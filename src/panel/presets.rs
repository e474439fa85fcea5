use crate::intersect::Anchor;
use crate::style::{PopupTemplate, StyleRule};

use super::spec::{LayerSpec, PanelSpec, SourceRef, StageSpec};

/// Names accepted by [`preset`].
pub const PRESETS: [&str; 4] = ["flood-intersections", "crashes", "building-conditions", "transport-projects"];

/// Look up a built-in panel definition by name.
pub fn preset(name: &str) -> Option<PanelSpec> {
    match name {
        "flood-intersections" => Some(flood_intersections()),
        "crashes" => Some(crashes()),
        "building-conditions" => Some(building_conditions()),
        "transport-projects" => Some(transport_projects()),
        _ => None,
    }
}

fn city_portal(label: &str) -> SourceRef {
    SourceRef { label: label.to_string(), url: Some("https://data.austintexas.gov".into()) }
}

/// Floodplains loaded visibly first, then the buildings and streets that fall inside them.
/// Neighborhoods and the full building/street layers load in the background, hidden.
pub fn flood_intersections() -> PanelSpec {
    let building_popup = PopupTemplate::new(Some("building_name"), &[("Condition", "condition"), ("Use", "building_use")]);
    let street_popup = PopupTemplate::new(Some("full_street_name"), &[("Condition", "condition")]);

    PanelSpec {
        name: "flood-intersections".into(),
        title: "Floodplains and city infrastructure".into(),
        sources: vec![
            city_portal("FEMA 100-year floodplain"),
            city_portal("City-owned buildings"),
            city_portal("Street segment condition"),
        ],
        background: vec![
            LayerSpec::new("neighborhoods", "/data/neighborhoods.json")
                .style(StyleRule::Fixed { color: "#607d8b".into() })
                .popup(PopupTemplate::new(Some("neighname"), &[])),
            LayerSpec::new("buildings", "/data/buildings.json")
                .style(StyleRule::Condition { field: "condition".into() })
                .popup(building_popup.clone())
                .hidden(),
            LayerSpec::new("streets", "/data/streets.json")
                .style(StyleRule::Condition { field: "condition".into() })
                .popup(street_popup.clone())
                .hidden(),
        ],
        stages: vec![
            StageSpec {
                name: "floodplains".into(),
                layers: vec![
                    LayerSpec::new("floodplains", "/data/floodplains.json")
                        .style(StyleRule::Fixed { color: "#1e88e5".into() })
                        .popup(PopupTemplate::new(Some("flood_zone"), &[])),
                ],
            },
            StageSpec {
                name: "intersections".into(),
                layers: vec![
                    LayerSpec::new("flooded_buildings", "/data/buildings.json")
                        .style(StyleRule::Fixed { color: "#d81b60".into() })
                        .popup(building_popup)
                        .within("floodplains", Anchor::Centroid),
                    LayerSpec::new("flooded_streets", "/data/streets.json")
                        .style(StyleRule::Fixed { color: "#8e24aa".into() })
                        .popup(street_popup)
                        .within("floodplains", Anchor::AnyVertex),
                ],
            },
        ],
    }
}

pub fn crashes() -> PanelSpec {
    PanelSpec {
        name: "crashes".into(),
        title: "Traffic crashes by severity".into(),
        sources: vec![city_portal("Austin crash report data")],
        background: vec![],
        stages: vec![StageSpec {
            name: "crashes".into(),
            layers: vec![
                LayerSpec::new("crashes", "/data/crashes.json")
                    .style(StyleRule::Severity { field: "crash_sev".into() })
                    .popup(PopupTemplate::new(Some("crash_date"), &[("Severity", "crash_sev"), ("Street", "rpt_street_name")])),
            ],
        }],
    }
}

pub fn building_conditions() -> PanelSpec {
    PanelSpec {
        name: "building-conditions".into(),
        title: "Facility condition assessments".into(),
        sources: vec![city_portal("Facility condition index")],
        background: vec![
            LayerSpec::new("council_districts", "/data/council_districts.json")
                .style(StyleRule::Fixed { color: "#9e9e9e".into() })
                .popup(PopupTemplate::new(Some("district"), &[])),
        ],
        stages: vec![StageSpec {
            name: "buildings".into(),
            layers: vec![
                LayerSpec::new("buildings", "/data/buildings.json")
                    .style(StyleRule::Condition { field: "condition".into() })
                    .popup(PopupTemplate::new(Some("building_name"), &[("Condition", "condition"), ("Year built", "year_built")])),
            ],
        }],
    }
}

pub fn transport_projects() -> PanelSpec {
    PanelSpec {
        name: "transport-projects".into(),
        title: "Mobility bond projects".into(),
        sources: vec![city_portal("Corridor program projects")],
        background: vec![
            LayerSpec::new("plan_areas", "/data/plan_areas.json")
                .style(StyleRule::Fixed { color: "#78909c".into() })
                .popup(PopupTemplate::new(Some("plan_area"), &[]))
                .hidden(),
        ],
        stages: vec![
            StageSpec {
                name: "traffic".into(),
                layers: vec![
                    LayerSpec::new("traffic_segments", "/data/traffic_segments.json")
                        .style(StyleRule::Grade { field: "final_grade".into() })
                        .popup(PopupTemplate::new(Some("segment_name"), &[("Grade", "final_grade")])),
                ],
            },
            StageSpec {
                name: "projects".into(),
                layers: vec![
                    LayerSpec::new("projects", "/data/transport_projects.json")
                        .style(StyleRule::Fixed { color: "#00897b".into() })
                        .popup(PopupTemplate::new(Some("project_name"), &[("Status", "status"), ("Budget", "budget")])),
                ],
            },
        ],
    }
}
