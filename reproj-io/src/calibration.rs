//! Per-frame calibration records in OpenCV FileStorage XML
//!
//! ```xml
//! <?xml version="1.0" encoding="utf-8"?>
//! <opencv_storage>
//!   <FocalLengthX>721.5377</FocalLengthX>
//!   <FocalLengthY>721.5377</FocalLengthY>
//!   <CenterX>609.5593</CenterX>
//!   <CenterY>172.854</CenterY>
//!   <P0>44.85728</P0>
//!   <P1>0.2163791</P1>
//!   <BaseLine>0.54</BaseLine>
//!   <Height>1.65</Height>
//!   <Tilt>0.</Tilt>
//! </opencv_storage>
//! ```

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use reproj_core::{CalibrationError, CameraModel, CameraParameters};

use crate::error::{IoError, Result};

const ROOT: &str = "opencv_storage";

/// Read and validate a calibration file
pub fn read_calibration<P: AsRef<Path>>(path: P) -> std::result::Result<CameraModel, CalibrationError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|e| CalibrationError::Unreadable(format!("{}: {e}", path.display())))?;
    let params = parse_calibration(&text)?;
    CameraModel::new(params)
}

/// Parse calibration values without validating them.
///
/// `Height` may be absent and defaults to 0; every other field is required.
pub fn parse_calibration(xml: &str) -> std::result::Result<CameraParameters, CalibrationError> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| CalibrationError::Unreadable(e.to_string()))?;
    let root = doc.root_element();
    if root.tag_name().name() != ROOT {
        return Err(CalibrationError::Unreadable(format!(
            "expected <{ROOT}> root, found <{}>",
            root.tag_name().name()
        )));
    }

    let field = |name: &str| -> std::result::Result<Option<f32>, CalibrationError> {
        let Some(node) = root.children().find(|n| n.has_tag_name(name)) else {
            return Ok(None);
        };
        let text = node.text().unwrap_or("").trim();
        text.parse::<f32>()
            .map(Some)
            .map_err(|_| CalibrationError::Malformed {
                field: name.to_string(),
                value: text.to_string(),
            })
    };
    let required = |name: &str| -> std::result::Result<f32, CalibrationError> {
        field(name)?.ok_or_else(|| CalibrationError::MissingField(name.to_string()))
    };

    Ok(CameraParameters {
        fu: required("FocalLengthX")?,
        fv: required("FocalLengthY")?,
        u0: required("CenterX")?,
        v0: required("CenterY")?,
        baseline: required("BaseLine")?,
        height: field("Height")?.unwrap_or(0.0),
        tilt: required("Tilt")?,
        p0: required("P0")?,
        p1: required("P1")?,
    })
}

/// Serialize calibration values in the layout `read_calibration` expects
pub fn format_calibration(params: &CameraParameters) -> String {
    let mut xml = String::from("<?xml version='1.0' encoding='utf-8'?>\n");
    xml.push_str("<opencv_storage>\n");
    let fields = [
        ("FocalLengthX", params.fu),
        ("FocalLengthY", params.fv),
        ("CenterX", params.u0),
        ("CenterY", params.v0),
        ("P0", params.p0),
        ("P1", params.p1),
        ("BaseLine", params.baseline),
        ("Height", params.height),
        ("Tilt", params.tilt),
    ];
    for (name, value) in fields {
        let _ = writeln!(xml, "  <{name}>{value}</{name}>");
    }
    xml.push_str("</opencv_storage>\n");
    xml
}

pub fn write_calibration<P: AsRef<Path>>(path: P, params: &CameraParameters) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, format_calibration(params)).map_err(|e| IoError::file(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KITTI_XML: &str = r#"<?xml version="1.0"?>
<opencv_storage>
<FocalLengthX>7.215377000000e+02</FocalLengthX>
<FocalLengthY>7.215377000000e+02</FocalLengthY>
<CenterX>6.095593000000e+02</CenterX>
<CenterY>1.728540000000e+02</CenterY>
<P0>4.485728000000e+01</P0>
<P1>2.163791000000e-01</P1>
<BaseLine>0.54</BaseLine>
<Height>1.65</Height>
<Tilt>0.</Tilt>
</opencv_storage>
"#;

    #[test]
    fn test_parse_opencv_storage() {
        let params = parse_calibration(KITTI_XML).unwrap();
        assert_eq!(params.fu, 721.5377);
        assert_eq!(params.fv, 721.5377);
        assert_eq!(params.u0, 609.5593);
        assert_eq!(params.v0, 172.854);
        assert_eq!(params.p0, 44.85728);
        assert_eq!(params.p1, 0.2163791);
        assert_eq!(params.baseline, 0.54);
        assert_eq!(params.height, 1.65);
        assert_eq!(params.tilt, 0.0);
    }

    #[test]
    fn test_missing_baseline() {
        let xml = KITTI_XML.replace("<BaseLine>0.54</BaseLine>\n", "");
        assert_eq!(
            parse_calibration(&xml).unwrap_err(),
            CalibrationError::MissingField("BaseLine".to_string())
        );
    }

    #[test]
    fn test_height_is_optional() {
        let xml = KITTI_XML.replace("<Height>1.65</Height>\n", "");
        assert_eq!(parse_calibration(&xml).unwrap().height, 0.0);
    }

    #[test]
    fn test_malformed_number() {
        let xml = KITTI_XML.replace("<P0>4.485728000000e+01</P0>", "<P0>forty</P0>");
        assert!(matches!(
            parse_calibration(&xml),
            Err(CalibrationError::Malformed { field, .. }) if field == "P0"
        ));
    }

    #[test]
    fn test_rejects_wrong_root_and_garbage() {
        assert!(matches!(
            parse_calibration("<camera><BaseLine>1</BaseLine></camera>"),
            Err(CalibrationError::Unreadable(_))
        ));
        assert!(matches!(
            parse_calibration("not xml at all"),
            Err(CalibrationError::Unreadable(_))
        ));
    }

    #[test]
    fn test_read_validates_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("000001.xml");
        let xml = KITTI_XML.replace("<BaseLine>0.54</BaseLine>", "<BaseLine>0</BaseLine>");
        std::fs::write(&path, xml).unwrap();

        assert!(matches!(
            read_calibration(&path),
            Err(CalibrationError::InvalidCalibration { field: "BaseLine", .. })
        ));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_calibration(dir.path().join("nope.xml")),
            Err(CalibrationError::Unreadable(_))
        ));
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calib.xml");
        let params = CameraParameters {
            fu: 700.5,
            fv: 701.25,
            u0: 320.0,
            v0: 240.0,
            baseline: 0.12,
            height: 1.2,
            tilt: 0.02,
            p0: -3.5,
            p1: 0.25,
        };
        write_calibration(&path, &params).unwrap();

        let camera = read_calibration(&path).unwrap();
        assert_eq!(camera.parameters(), &params);
    }
}
