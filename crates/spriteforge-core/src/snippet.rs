/// Loader example for the exported files, written next to the atlas as
/// `<base>.usage.txt`.
pub fn usage_snippet(format_id: &str, image_base: &str) -> String {
    let n = image_base;
    match format_id {
        "pixijs" => format!(
            "// PixiJS\nimport {{ Assets }} from 'pixi.js';\nconst sheet = await Assets.load('{n}.json');\nconst sprite = new PIXI.Sprite(sheet.textures['frameName']);\napp.stage.addChild(sprite);"
        ),
        "phaser" => format!(
            "// Phaser 3\nthis.load.multiatlas('{n}', '{n}.json');\n// In create():\nthis.add.sprite(400, 300, '{n}', 'frameName');"
        ),
        "unity" => format!(
            "// Unity C#\nSprite[] sprites = Resources.LoadAll<Sprite>(\"{n}\");\nGetComponent<SpriteRenderer>().sprite = sprites[0];"
        ),
        "godot" => format!(
            "# Godot GDScript\n# Import {n}.tpsheet with the TexturePacker importer plugin\nvar texture = load(\"res://{n}/frameName.tres\")\n$Sprite2D.texture = texture"
        ),
        "css" => format!(
            "<!-- HTML + CSS -->\n<link rel=\"stylesheet\" href=\"{n}.css\">\n<div class=\"sprite sprite-frameName\"></div>"
        ),
        "spine" => format!(
            "// Spine Runtime\nvar atlas = new spine.TextureAtlas('{n}.atlas');\nvar skeleton = new spine.Skeleton(skeletonData);"
        ),
        "starling" => format!(
            "// Starling\nvar atlas:TextureAtlas = new TextureAtlas(Texture.fromBitmap(bitmap), XML(atlasXml)); // {n}.xml\nvar image:Image = new Image(atlas.getTexture(\"frameName\"));"
        ),
        "cocos2d" => format!(
            "// Cocos2d\nauto cache = SpriteFrameCache::getInstance();\ncache->addSpriteFramesWithFile(\"{n}.plist\");\nauto sprite = Sprite::createWithSpriteFrameName(\"frameName\");"
        ),
        "unreal" => format!(
            "// Unreal Paper2D\n// Import {n}.paper2dsprites via Content Browser\n// Create Paper2D Sprite from imported atlas"
        ),
        _ => format!("// Load {n}.json and {n}.png"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_the_right_files() {
        assert!(usage_snippet("cocos2d", "hero").contains("hero.plist"));
        assert!(usage_snippet("css", "ui").contains("href=\"ui.css\""));
        assert!(usage_snippet("pixijs", "a").contains("Assets.load('a.json')"));
    }

    #[test]
    fn falls_back_for_other_formats() {
        assert_eq!(usage_snippet("json", "s"), "// Load s.json and s.png");
        assert_eq!(usage_snippet("xml", "s"), "// Load s.json and s.png");
    }
}
