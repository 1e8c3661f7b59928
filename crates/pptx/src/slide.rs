//! Slide model builder: one slide's XML to a typed shape list.

use crate::style::RunProperties;
use crate::theme::ThemeColors;
use crate::xml::Element;
use deck_core::units::{angle_to_radians, emu_to_px, pt_to_px};
use deck_core::{
    Alignment, Anchor, DashStyle, FlowDirection, Geometry, LineJoin, Paragraph, Result, Run,
    Shape, ShapeKind, Stroke, TextBody, Transform,
};
use std::collections::HashMap;

/// Resolves a picture's relationship id to raw image bytes.
pub trait ImageSource {
    /// `None` when the id is unknown or the target part is missing.
    fn image_bytes(&mut self, rel_id: &str) -> Option<Vec<u8>>;
}

impl ImageSource for HashMap<String, Vec<u8>> {
    fn image_bytes(&mut self, rel_id: &str) -> Option<Vec<u8>> {
        self.get(rel_id).cloned()
    }
}

/// Builds the shape list of a slide.
pub struct SlideModelBuilder<'a> {
    theme: &'a ThemeColors,
    scale: f32,
}

impl<'a> SlideModelBuilder<'a> {
    /// Create a builder resolving colors through `theme` and sizing text for
    /// a surface at `scale` pixels per CSS pixel.
    pub fn new(theme: &'a ThemeColors, scale: f32) -> Self {
        Self { theme, scale }
    }

    /// Parse a slide part. Shapes come back in document order; pictures
    /// whose image cannot be resolved are left out.
    pub fn build(&self, xml: &str, images: &mut dyn ImageSource) -> Result<Vec<Shape>> {
        let root = Element::parse(xml)?;
        let Some(tree) = root.path(&["cSld", "spTree"]) else {
            log::debug!("Slide has no shape tree");
            return Ok(Vec::new());
        };

        let mut shapes = Vec::new();
        for node in &tree.children {
            match node.name.as_str() {
                "sp" => shapes.push(self.auto_shape(node)),
                "pic" => {
                    if let Some(picture) = self.picture(node, images) {
                        shapes.push(picture);
                    }
                }
                "nvGrpSpPr" | "grpSpPr" | "extLst" => {}
                other => log::debug!("Skipping unsupported slide element '{}'", other),
            }
        }

        Ok(shapes)
    }

    fn auto_shape(&self, node: &Element) -> Shape {
        let sp_pr = node.child("spPr");
        let geometry = sp_pr
            .and_then(|p| p.child("prstGeom"))
            .and_then(|g| g.attr("prst"))
            .map(Geometry::from_preset)
            .unwrap_or_default();

        Shape {
            transform: transform(node),
            rotation: rotation(node),
            fill: sp_pr.and_then(|p| p.child("solidFill")).and_then(|f| self.theme.resolve(f)),
            stroke: sp_pr.and_then(|p| p.child("ln")).and_then(|ln| self.stroke(ln)),
            kind: ShapeKind::AutoShape {
                geometry,
                text: node.child("txBody").and_then(|body| self.text_body(body)),
            },
        }
    }

    fn picture(&self, node: &Element, images: &mut dyn ImageSource) -> Option<Shape> {
        let Some(rel_id) = node
            .path(&["blipFill", "blip"])
            .and_then(|blip| blip.attr("embed"))
        else {
            log::debug!("Picture without embedded image reference");
            return None;
        };
        let Some(image) = images.image_bytes(rel_id) else {
            log::debug!("Skipping picture: relationship '{}' did not resolve", rel_id);
            return None;
        };

        Some(Shape {
            transform: transform(node),
            rotation: rotation(node),
            fill: None,
            stroke: None,
            kind: ShapeKind::Picture {
                rel_id: rel_id.to_string(),
                image,
            },
        })
    }

    fn stroke(&self, line: &Element) -> Option<Stroke> {
        let color = self.theme.solid_fill(line)?;
        let width = emu_to_px(line.attr_i64("w").unwrap_or(0), self.scale).max(1.0);
        let dash = line
            .child("prstDash")
            .and_then(|d| d.attr("val"))
            .map(DashStyle::from_preset)
            .unwrap_or_default();
        let join = if line.child("round").is_some() {
            LineJoin::Round
        } else if line.child("bevel").is_some() {
            LineJoin::Bevel
        } else {
            LineJoin::Miter
        };
        Some(Stroke {
            color,
            width,
            dash,
            join,
        })
    }

    fn text_body(&self, body: &Element) -> Option<TextBody> {
        let body_pr = body.child("bodyPr");
        let anchor = match body_pr.and_then(|b| b.attr("anchor")) {
            Some("ctr") => Anchor::Center,
            Some("b") => Anchor::Bottom,
            Some("just") | Some("dist") => Anchor::Justify,
            _ => Anchor::Top,
        };
        let flow = match body_pr.and_then(|b| b.attr("vert")) {
            Some("vert") => FlowDirection::VerticalTopToBottom,
            Some("vert270") | Some("eaVert") => FlowDirection::VerticalRightToLeft,
            _ => FlowDirection::Horizontal,
        };

        let list_level = RunProperties::from_optional(
            body.path(&["lstStyle", "lvl1pPr", "defRPr"]),
            self.theme,
            self.scale,
        );
        let base = RunProperties::builtin().overlay(&list_level);

        let paragraphs: Vec<Paragraph> = body
            .children_named("p")
            .filter_map(|p| self.paragraph(p, &base))
            .collect();
        if paragraphs.is_empty() {
            return None;
        }

        Some(TextBody {
            paragraphs,
            anchor,
            flow,
        })
    }

    /// Paragraphs without any text runs are dropped.
    fn paragraph(&self, node: &Element, base: &RunProperties) -> Option<Paragraph> {
        let p_pr = node.child("pPr");
        let defaults = base.overlay(&RunProperties::from_optional(
            p_pr.and_then(|p| p.child("defRPr")),
            self.theme,
            self.scale,
        ));

        let mut runs = Vec::new();
        for child in &node.children {
            let text = match child.name.as_str() {
                "r" | "fld" => match child.child("t") {
                    Some(t) => t.text().to_string(),
                    None => continue,
                },
                "br" => "\n".to_string(),
                _ => continue,
            };
            let own = RunProperties::from_optional(child.child("rPr"), self.theme, self.scale);
            runs.push(Run {
                text,
                style: defaults.overlay(&own).resolve(self.scale),
            });
        }
        if runs.is_empty() {
            return None;
        }

        let align = match p_pr.and_then(|p| p.attr("algn")) {
            Some("ctr") => Alignment::Center,
            Some("r") => Alignment::Right,
            Some("just") | Some("dist") => Alignment::Justify,
            _ => Alignment::Left,
        };

        let mut paragraph = Paragraph {
            runs,
            align,
            line_spacing: 1.0,
            space_before: 0.0,
            space_after: 0.0,
            gap_ratio: None,
            default_style: defaults.resolve(self.scale),
        };
        let line_height = paragraph.default_line_height();

        let spacing = |name: &str| p_pr.and_then(|p| p.child(name));
        paragraph.line_spacing = match spacing("lnSpc").map(Spacing::from_element) {
            Some(Spacing::Points(pts)) if line_height > 0.0 => {
                pt_to_px(pts, self.scale) / line_height
            }
            Some(Spacing::Percent(ratio)) => ratio,
            _ => 1.0,
        };

        let before = spacing("spcBef").map(Spacing::from_element).unwrap_or_default();
        let after = spacing("spcAft").map(Spacing::from_element).unwrap_or_default();
        paragraph.space_before = before.to_px(line_height, self.scale);
        paragraph.space_after = after.to_px(line_height, self.scale);
        paragraph.gap_ratio = after.percent().or_else(|| before.percent());

        Some(paragraph)
    }
}

/// A spacing value from `a:lnSpc`, `a:spcBef` or `a:spcAft`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
enum Spacing {
    #[default]
    None,
    /// Points.
    Points(f32),
    /// Fraction of the line height.
    Percent(f32),
}

impl Spacing {
    /// Zero values count as unset.
    fn from_element(node: &Element) -> Self {
        let value = |name: &str| {
            node.child(name)
                .and_then(|n| n.attr_i64("val"))
                .filter(|v| *v != 0)
        };
        if let Some(pts) = value("spcPts") {
            Spacing::Points(pts as f32 / 100.0)
        } else if let Some(pct) = value("spcPct") {
            Spacing::Percent(pct as f32 / 100_000.0)
        } else {
            Spacing::None
        }
    }

    fn to_px(self, line_height: f32, scale: f32) -> f32 {
        match self {
            Spacing::None => 0.0,
            Spacing::Points(pts) => pt_to_px(pts, scale),
            Spacing::Percent(ratio) => ratio * line_height,
        }
    }

    fn percent(self) -> Option<f32> {
        match self {
            Spacing::Percent(ratio) => Some(ratio),
            _ => None,
        }
    }
}

/// The `a:xfrm` of a shape, looked up under the parents it can appear in.
fn xfrm(node: &Element) -> Option<&Element> {
    ["spPr", "picPr", "blipFill"]
        .iter()
        .find_map(|parent| node.path(&[*parent, "xfrm"]))
}

/// Missing transforms give a zero-size shape, which is never drawn.
fn transform(node: &Element) -> Transform {
    let Some(xfrm) = xfrm(node) else {
        return Transform::default();
    };
    let off = xfrm.child("off");
    let ext = xfrm.child("ext");
    let get = |el: Option<&Element>, key: &str| el.and_then(|e| e.attr_i64(key)).unwrap_or(0);
    Transform {
        x: get(off, "x"),
        y: get(off, "y"),
        width: get(ext, "cx"),
        height: get(ext, "cy"),
    }
}

fn rotation(node: &Element) -> f32 {
    xfrm(node)
        .and_then(|x| x.attr_i64("rot"))
        .map(angle_to_radians)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::{Rgb, UnderlineKind};

    fn theme() -> ThemeColors {
        let mut theme = ThemeColors::new();
        theme.insert("lt1", Rgb::WHITE);
        theme.insert("accent1", Rgb::new(0x44, 0x72, 0xc4));
        theme
    }

    fn slide(tree: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <p:sld xmlns:a="urn:a" xmlns:p="urn:p" xmlns:r="urn:r">
              <p:cSld><p:spTree>
                <p:nvGrpSpPr/><p:grpSpPr/>
                {}
              </p:spTree></p:cSld>
            </p:sld>"#,
            tree
        )
    }

    fn build(tree: &str) -> Vec<Shape> {
        let theme = theme();
        let mut images: HashMap<String, Vec<u8>> = HashMap::new();
        images.insert("rId2".to_string(), vec![1, 2, 3]);
        SlideModelBuilder::new(&theme, 2.0)
            .build(&slide(tree), &mut images)
            .unwrap()
    }

    #[test]
    fn test_full_slide_rectangle() {
        let shapes = build(
            r#"<p:sp>
                 <p:spPr>
                   <a:xfrm><a:off x="0" y="0"/><a:ext cx="9144000" cy="6858000"/></a:xfrm>
                   <a:prstGeom prst="rect"><a:avLst/></a:prstGeom>
                   <a:solidFill><a:schemeClr val="bg1"/></a:solidFill>
                 </p:spPr>
               </p:sp>"#,
        );
        assert_eq!(shapes.len(), 1);
        let shape = &shapes[0];
        assert_eq!(shape.transform.width, 9_144_000);
        assert_eq!(shape.fill, Some(Rgb::WHITE));
        assert!(shape.stroke.is_none());
        assert!(shape.text_body().is_none());
    }

    #[test]
    fn test_missing_transform_gives_zero_size() {
        let shapes = build(r#"<p:sp><p:spPr/></p:sp>"#);
        assert_eq!(shapes[0].transform, Transform::default());
        assert!(!shapes[0].transform.is_drawable());
    }

    #[test]
    fn test_stroke_properties() {
        let shapes = build(
            r#"<p:sp><p:spPr>
                 <a:prstGeom prst="ellipse"/>
                 <a:ln w="38100"><a:solidFill><a:schemeClr val="accent1"/></a:solidFill>
                   <a:prstDash val="lgDashDot"/><a:round/></a:ln>
               </p:spPr></p:sp>"#,
        );
        let stroke = shapes[0].stroke.unwrap();
        assert_eq!(stroke.color, Rgb::new(0x44, 0x72, 0xc4));
        assert!((stroke.width - 8.0).abs() < 1e-4);
        assert_eq!(stroke.dash, DashStyle::LongDashDot);
        assert_eq!(stroke.join, LineJoin::Round);
        assert!(matches!(
            shapes[0].kind,
            ShapeKind::AutoShape {
                geometry: Geometry::Ellipse,
                ..
            }
        ));
    }

    #[test]
    fn test_unresolved_fill_is_absent() {
        let shapes = build(
            r#"<p:sp><p:spPr><a:solidFill><a:schemeClr val="accent5"/></a:solidFill></p:spPr></p:sp>"#,
        );
        assert!(shapes[0].fill.is_none());
    }

    #[test]
    fn test_picture_resolution() {
        let shapes = build(
            r#"<p:pic>
                 <p:blipFill><a:blip r:embed="rId2"/></p:blipFill>
                 <p:spPr><a:xfrm rot="5400000"><a:off x="10" y="20"/><a:ext cx="30" cy="40"/></a:xfrm></p:spPr>
               </p:pic>
               <p:pic>
                 <p:blipFill><a:blip r:embed="rId9"/></p:blipFill>
               </p:pic>"#,
        );
        assert_eq!(shapes.len(), 1);
        match &shapes[0].kind {
            ShapeKind::Picture { rel_id, image } => {
                assert_eq!(rel_id, "rId2");
                assert_eq!(image, &vec![1, 2, 3]);
            }
            other => panic!("expected picture, got {:?}", other),
        }
        assert!((shapes[0].rotation - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_text_body_inheritance() {
        let shapes = build(
            r#"<p:sp>
                 <p:txBody>
                   <a:bodyPr anchor="ctr" vert="vert270"/>
                   <a:lstStyle><a:lvl1pPr><a:defRPr sz="2400" i="1"/></a:lvl1pPr></a:lstStyle>
                   <a:p>
                     <a:pPr algn="ctr"><a:defRPr b="1"><a:solidFill><a:srgbClr val="FF0000"/></a:solidFill></a:defRPr></a:pPr>
                     <a:r><a:rPr sz="1200" u="sng"/><a:t>Hello </a:t></a:r>
                     <a:br/>
                     <a:fld id="{1}" type="slidenum"><a:t>7</a:t></a:fld>
                   </a:p>
                   <a:p><a:endParaRPr/></a:p>
                 </p:txBody>
               </p:sp>"#,
        );
        let body = shapes[0].text_body().unwrap();
        assert_eq!(body.anchor, Anchor::Center);
        assert_eq!(body.flow, FlowDirection::VerticalRightToLeft);
        assert_eq!(body.paragraphs.len(), 1);

        let paragraph = &body.paragraphs[0];
        assert_eq!(paragraph.align, Alignment::Center);
        let texts: Vec<&str> = paragraph.runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["Hello ", "\n", "7"]);

        let first = &paragraph.runs[0].style;
        assert_eq!(first.font_size, 32.0);
        assert_eq!(first.color, Rgb::new(255, 0, 0));
        assert_eq!(first.underline, UnderlineKind::Single);
        assert!(first.bold && first.italic);

        let field = &paragraph.runs[2].style;
        assert_eq!(field.font_size, 64.0);
        assert_eq!(field.underline, UnderlineKind::None);
        assert_eq!(paragraph.default_style.font_size, 64.0);
    }

    #[test]
    fn test_paragraph_spacing() {
        let shapes = build(
            r#"<p:sp><p:txBody><a:bodyPr/>
                 <a:p>
                   <a:pPr>
                     <a:lnSpc><a:spcPct val="150000"/></a:lnSpc>
                     <a:spcBef><a:spcPts val="600"/></a:spcBef>
                     <a:spcAft><a:spcPct val="20000"/></a:spcAft>
                   </a:pPr>
                   <a:r><a:rPr sz="1800"/><a:t>x</a:t></a:r>
                 </a:p>
               </p:txBody></p:sp>"#,
        );
        let paragraph = &shapes[0].text_body().unwrap().paragraphs[0];
        assert_eq!(paragraph.line_spacing, 1.5);
        assert!((paragraph.space_before - 16.0).abs() < 1e-4);
        // 48px font, 60px line height.
        assert!((paragraph.space_after - 12.0).abs() < 1e-4);
        assert_eq!(paragraph.gap_ratio, Some(0.2));
    }

    #[test]
    fn test_line_spacing_in_points() {
        let shapes = build(
            r#"<p:sp><p:txBody><a:bodyPr/>
                 <a:p><a:pPr><a:lnSpc><a:spcPts val="4500"/></a:lnSpc></a:pPr>
                   <a:r><a:t>x</a:t></a:r></a:p>
               </p:txBody></p:sp>"#,
        );
        let paragraph = &shapes[0].text_body().unwrap().paragraphs[0];
        // 45pt = 120px at scale 2 over a 60px default line.
        assert!((paragraph.line_spacing - 2.0).abs() < 1e-4);
        assert_eq!(paragraph.gap_ratio, None);
    }

    #[test]
    fn test_unsupported_elements_are_skipped() {
        let shapes = build(r#"<p:graphicFrame/><p:cxnSp/>"#);
        assert!(shapes.is_empty());
    }
}
