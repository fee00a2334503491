//! Chart Deck Module
//! Bundles rendered chart PNGs into a PowerPoint file, four charts per
//! slide in a 2x2 grid, by writing the OOXML parts into a ZIP directly.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use tracing::info;
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::ZipWriter;

/// EMU (English Metric Units) conversion: 914400 EMU = 1 inch
const EMU_PER_INCH: i64 = 914400;
/// 16:9 slide, 10 x 5.625 inches
const SLIDE_WIDTH: i64 = 9144000;
const SLIDE_HEIGHT: i64 = 5143500;
const TITLE_HEIGHT: i64 = EMU_PER_INCH / 2;
const CHARTS_PER_SLIDE: usize = 4;

const NS_MAIN: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PRES: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_TYPE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("No charts to put in the deck")]
    Empty,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("ZIP error: {0}")]
    Zip(#[from] ZipError),
}

/// One chart image for the deck.
#[derive(Debug, Clone)]
pub struct DeckImage {
    pub caption: String,
    pub png: Vec<u8>,
}

/// Placement of a picture on a slide, in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

pub struct DeckGenerator;

impl DeckGenerator {
    /// 2x2 grid below the slide title, with a quarter-inch gap.
    pub fn grid_frames() -> [Frame; CHARTS_PER_SLIDE] {
        let margin = EMU_PER_INCH / 4;
        let gap = EMU_PER_INCH / 8;
        let top = margin + TITLE_HEIGHT;
        let cx = (SLIDE_WIDTH - 2 * margin - gap) / 2;
        let cy = (SLIDE_HEIGHT - top - margin - gap) / 2;
        [
            Frame { x: margin, y: top, cx, cy },
            Frame { x: margin + cx + gap, y: top, cx, cy },
            Frame { x: margin, y: top + cy + gap, cx, cy },
            Frame { x: margin + cx + gap, y: top + cy + gap, cx, cy },
        ]
    }

    /// Write the deck and return the number of slides.
    pub fn write_deck(images: &[DeckImage], output_path: &Path, title: &str) -> Result<usize, DeckError> {
        if images.is_empty() {
            return Err(DeckError::Empty);
        }

        let slides: Vec<&[DeckImage]> = images.chunks(CHARTS_PER_SLIDE).collect();
        let slide_count = slides.len();
        let mut zip = ZipWriter::new(File::create(output_path)?);
        let options = FileOptions::default();

        let part = |zip: &mut ZipWriter<File>, name: &str, body: &[u8]| -> Result<(), DeckError> {
            zip.start_file(name, options)?;
            zip.write_all(body)?;
            Ok(())
        };

        part(&mut zip, "[Content_Types].xml", Self::content_types_xml(slide_count).as_bytes())?;
        part(&mut zip, "_rels/.rels", Self::package_rels_xml().as_bytes())?;
        part(&mut zip, "ppt/presentation.xml", Self::presentation_xml(slide_count).as_bytes())?;
        part(
            &mut zip,
            "ppt/_rels/presentation.xml.rels",
            Self::presentation_rels_xml(slide_count).as_bytes(),
        )?;

        let frames = Self::grid_frames();
        let mut image_no = 0;
        for (idx, chunk) in slides.iter().enumerate() {
            let slide_no = idx + 1;
            let first_image = image_no + 1;
            image_no += chunk.len();

            let heading = format!("{} ({}/{})", title, slide_no, slide_count);
            part(
                &mut zip,
                &format!("ppt/slides/slide{}.xml", slide_no),
                Self::slide_xml(&heading, chunk, &frames).as_bytes(),
            )?;
            part(
                &mut zip,
                &format!("ppt/slides/_rels/slide{}.xml.rels", slide_no),
                Self::slide_rels_xml(first_image, chunk.len()).as_bytes(),
            )?;
        }

        for (idx, image) in images.iter().enumerate() {
            part(&mut zip, &format!("ppt/media/image{}.png", idx + 1), &image.png)?;
        }

        part(&mut zip, "ppt/slideLayouts/slideLayout1.xml", Self::slide_layout_xml().as_bytes())?;
        part(
            &mut zip,
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            Self::single_rel_xml("slideMaster", "../slideMasters/slideMaster1.xml").as_bytes(),
        )?;
        part(&mut zip, "ppt/slideMasters/slideMaster1.xml", Self::slide_master_xml().as_bytes())?;
        part(
            &mut zip,
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            Self::master_rels_xml().as_bytes(),
        )?;
        part(&mut zip, "ppt/theme/theme1.xml", Self::theme_xml().as_bytes())?;
        part(&mut zip, "docProps/core.xml", Self::core_props_xml(title).as_bytes())?;
        part(&mut zip, "docProps/app.xml", Self::app_props_xml(slide_count).as_bytes())?;

        zip.finish()?;

        info!(
            "Deck written: {} ({} slides, {} charts)",
            output_path.display(),
            slide_count,
            images.len()
        );
        Ok(slide_count)
    }

    fn content_types_xml(slide_count: usize) -> String {
        let ct = "application/vnd.openxmlformats-officedocument";
        let mut xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Default Extension="png" ContentType="image/png"/>
<Override PartName="/ppt/presentation.xml" ContentType="{ct}.presentationml.presentation.main+xml"/>
<Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="{ct}.presentationml.slideMaster+xml"/>
<Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="{ct}.presentationml.slideLayout+xml"/>
<Override PartName="/ppt/theme/theme1.xml" ContentType="{ct}.theme+xml"/>
<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
<Override PartName="/docProps/app.xml" ContentType="{ct}.extended-properties+xml"/>
"#
        );
        for n in 1..=slide_count {
            xml.push_str(&format!(
                "<Override PartName=\"/ppt/slides/slide{n}.xml\" ContentType=\"{ct}.presentationml.slide+xml\"/>\n"
            ));
        }
        xml.push_str("</Types>");
        xml
    }

    fn relationships(rels: &[(usize, String, String)]) -> String {
        let mut xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<Relationships xmlns=\"{NS_PKG_REL}\">\n"
        );
        for (id, kind, target) in rels {
            xml.push_str(&format!(
                "<Relationship Id=\"rId{id}\" Type=\"{kind}\" Target=\"{target}\"/>\n"
            ));
        }
        xml.push_str("</Relationships>");
        xml
    }

    fn single_rel_xml(kind: &str, target: &str) -> String {
        Self::relationships(&[(1, format!("{REL_TYPE}/{kind}"), target.to_string())])
    }

    fn package_rels_xml() -> String {
        Self::relationships(&[
            (1, format!("{REL_TYPE}/officeDocument"), "ppt/presentation.xml".to_string()),
            (
                2,
                "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties"
                    .to_string(),
                "docProps/core.xml".to_string(),
            ),
            (3, format!("{REL_TYPE}/extended-properties"), "docProps/app.xml".to_string()),
        ])
    }

    /// rId1 master, rId2 theme, rId3.. slides
    fn presentation_rels_xml(slide_count: usize) -> String {
        let mut rels = vec![
            (1, format!("{REL_TYPE}/slideMaster"), "slideMasters/slideMaster1.xml".to_string()),
            (2, format!("{REL_TYPE}/theme"), "theme/theme1.xml".to_string()),
        ];
        rels.extend(
            (1..=slide_count).map(|n| (n + 2, format!("{REL_TYPE}/slide"), format!("slides/slide{n}.xml"))),
        );
        Self::relationships(&rels)
    }

    fn presentation_xml(slide_count: usize) -> String {
        let slide_ids: String = (1..=slide_count)
            .map(|n| format!("<p:sldId id=\"{}\" r:id=\"rId{}\"/>", 255 + n, n + 2))
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:a="{NS_MAIN}" xmlns:r="{NS_REL}" xmlns:p="{NS_PRES}">
<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>
<p:sldIdLst>{slide_ids}</p:sldIdLst>
<p:sldSz cx="{SLIDE_WIDTH}" cy="{SLIDE_HEIGHT}"/>
<p:notesSz cx="{SLIDE_HEIGHT}" cy="{SLIDE_WIDTH}"/>
</p:presentation>"#
        )
    }

    /// rId1 layout, rId2.. the slide's images
    fn slide_rels_xml(first_image: usize, count: usize) -> String {
        let mut rels = vec![(1, format!("{REL_TYPE}/slideLayout"), "../slideLayouts/slideLayout1.xml".to_string())];
        rels.extend((0..count).map(|i| {
            (
                i + 2,
                format!("{REL_TYPE}/image"),
                format!("../media/image{}.png", first_image + i),
            )
        }));
        Self::relationships(&rels)
    }

    fn slide_xml(heading: &str, images: &[DeckImage], frames: &[Frame]) -> String {
        let mut shapes = format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>
<p:spPr><a:xfrm><a:off x="{m}" y="{m}"/><a:ext cx="{w}" cy="{TITLE_HEIGHT}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr>
<p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US" sz="2000" b="1"/><a:t>{t}</a:t></a:r></a:p></p:txBody></p:sp>"#,
            m = EMU_PER_INCH / 4,
            w = SLIDE_WIDTH - EMU_PER_INCH / 2,
            t = escape_xml(heading),
        );

        for (idx, (image, frame)) in images.iter().zip(frames).enumerate() {
            let shape_id = idx + 3;
            let r_id = idx + 2;
            shapes.push_str(&format!(
                r#"
<p:pic><p:nvPicPr><p:cNvPr id="{shape_id}" name="{name}"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>
<p:blipFill><a:blip r:embed="rId{r_id}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>
<p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#,
                name = escape_xml(&image.caption),
                x = frame.x,
                y = frame.y,
                cx = frame.cx,
                cy = frame.cy,
            ));
        }

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="{NS_MAIN}" xmlns:r="{NS_REL}" xmlns:p="{NS_PRES}">
<p:cSld><p:spTree>{}
{shapes}
</p:spTree></p:cSld>
<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>
</p:sld>"#,
            group_shape_header()
        )
    }

    fn slide_layout_xml() -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout xmlns:a="{NS_MAIN}" xmlns:r="{NS_REL}" xmlns:p="{NS_PRES}" type="blank" preserve="1">
<p:cSld name="Blank"><p:spTree>{}</p:spTree></p:cSld>
<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>
</p:sldLayout>"#,
            group_shape_header()
        )
    }

    fn slide_master_xml() -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster xmlns:a="{NS_MAIN}" xmlns:r="{NS_REL}" xmlns:p="{NS_PRES}">
<p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg><p:spTree>{}</p:spTree></p:cSld>
<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>
<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>
</p:sldMaster>"#,
            group_shape_header()
        )
    }

    fn master_rels_xml() -> String {
        Self::relationships(&[
            (1, format!("{REL_TYPE}/slideLayout"), "../slideLayouts/slideLayout1.xml".to_string()),
            (2, format!("{REL_TYPE}/theme"), "../theme/theme1.xml".to_string()),
        ])
    }

    fn theme_xml() -> String {
        let colors = [
            ("dk2", "44546A"),
            ("lt2", "E7E6E6"),
            ("accent1", "5B9BD5"),
            ("accent2", "ED7D31"),
            ("accent3", "A5A5A5"),
            ("accent4", "FFC000"),
            ("accent5", "4472C4"),
            ("accent6", "70AD47"),
            ("hlink", "0563C1"),
            ("folHlink", "954F72"),
        ];
        let scheme: String = colors
            .iter()
            .map(|(slot, rgb)| format!("<a:{slot}><a:srgbClr val=\"{rgb}\"/></a:{slot}>"))
            .collect();
        let solid = "<a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill>";
        let line = "<a:ln w=\"9525\"><a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill></a:ln>";
        let effect = "<a:effectStyle><a:effectLst/></a:effectStyle>";
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="{NS_MAIN}" name="Charts">
<a:themeElements>
<a:clrScheme name="Charts"><a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>{scheme}</a:clrScheme>
<a:fontScheme name="Charts"><a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme>
<a:fmtScheme name="Charts"><a:fillStyleLst>{solid}{solid}{solid}</a:fillStyleLst><a:lnStyleLst>{line}{line}{line}</a:lnStyleLst><a:effectStyleLst>{effect}{effect}{effect}</a:effectStyleLst><a:bgFillStyleLst>{solid}{solid}{solid}</a:bgFillStyleLst></a:fmtScheme>
</a:themeElements>
</a:theme>"#
        )
    }

    fn core_props_xml(title: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/">
<dc:title>{}</dc:title>
<dc:creator>card_insights</dc:creator>
</cp:coreProperties>"#,
            escape_xml(title)
        )
    }

    fn app_props_xml(slide_count: usize) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">
<Application>card_insights</Application>
<PresentationFormat>On-screen Show (16:9)</PresentationFormat>
<Slides>{slide_count}</Slides>
</Properties>"#
        )
    }
}

fn group_shape_header() -> &'static str {
    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
