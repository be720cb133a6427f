use super::record::{SheetContext, fmt_num, xml_escape};
use crate::error::Result;
use std::fmt::Write as _;

const HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>frames</key>
    <dict>
"#;

/// Cocos2d frame list (plist format 2). Offsets are measured from the source
/// center with Y pointing up; `sourceColorRect` is the unrotated trimmed region.
pub fn cocos2d(ctx: &SheetContext) -> Result<String> {
    let mut s = String::from(HEADER);
    for r in &ctx.rects {
        let f = &r.frame;
        let sss = &r.sprite_source_size;
        // writing into a String cannot fail
        let _ = write!(
            s,
            "        <key>{}</key>\n        <dict>\n            <key>frame</key>\n            <string>{{{{{},{}}},{{{},{}}}}}</string>\n            <key>offset</key>\n            <string>{{{},{}}}</string>\n            <key>rotated</key>\n            <{}/>\n            <key>sourceColorRect</key>\n            <string>{{{{{},{}}},{{{},{}}}}}</string>\n            <key>sourceSize</key>\n            <string>{{{},{}}}</string>\n        </dict>\n",
            xml_escape(&r.name),
            f.x,
            f.y,
            f.w,
            f.h,
            fmt_num(r.offset_x),
            fmt_num(r.offset_y),
            if r.rotated { "true" } else { "false" },
            sss.x,
            sss.y,
            sss.w,
            sss.h,
            r.source_size.w,
            r.source_size.h,
        );
    }
    s.push_str("    </dict>\n    <key>metadata</key>\n    <dict>\n");
    let _ = write!(
        s,
        "        <key>format</key>\n        <integer>2</integer>\n        <key>realTextureFileName</key>\n        <string>{0}</string>\n        <key>size</key>\n        <string>{{{1},{2}}}</string>\n        <key>smartupdate</key>\n        <string>{3}:{4}</string>\n        <key>textureFileName</key>\n        <string>{0}</string>\n",
        xml_escape(&ctx.meta.image_name),
        ctx.meta.width,
        ctx.meta.height,
        ctx.meta.app,
        ctx.meta.version,
    );
    s.push_str("    </dict>\n</dict>\n</plist>\n");
    Ok(s)
}
