use std::env;
use std::fs::{self, read};
use std::path::PathBuf;

use psd_codec::nested_layers::{psd_to_nested_layers, Layer};
use psd_codec::PsdFile;

fn describe(layer: &Layer, depth: usize) -> serde_json::Value {
    let indent = "  ".repeat(depth);
    match layer {
        Layer::Group(group) => {
            println!("{indent}{} (group)", group.name);
            serde_json::json!({
                "name": group.name,
                "kind": "group",
                "children": group.layers.iter().map(|l| describe(l, depth + 1)).collect::<Vec<_>>(),
            })
        }
        Layer::Image(image) => {
            println!(
                "{indent}{} ({}x{})",
                image.name,
                image.right - image.left,
                image.bottom - image.top
            );
            serde_json::json!({
                "name": image.name,
                "kind": "image",
                "top": image.top,
                "left": image.left,
                "bottom": image.bottom,
                "right": image.right,
            })
        }
    }
}

fn main() -> Result<(), String> {
    env_logger::init();

    for argument in env::args_os().skip(1) {
        let path = PathBuf::from(argument);
        let bytes = read(&path).map_err(|err| format!("error opening file: {err}"))?;

        let psd = PsdFile::from_bytes(&bytes).map_err(|err| err.to_string())?;
        println!(
            "{}: {}x{} {:?} {:?}",
            path.display(),
            psd.width(),
            psd.height(),
            psd.color_mode(),
            psd.version()
        );

        let layers = psd_to_nested_layers(&psd, &bytes).map_err(|err| err.to_string())?;
        let summary: Vec<_> = layers.iter().map(|l| describe(l, 0)).collect();

        let mut out_path = path.clone();
        out_path.set_extension("layers.json");
        fs::write(&out_path, serde_json::to_string_pretty(&summary).unwrap())
            .map_err(|err| format!("error writing {}: {err}", out_path.display()))?;
        println!("written {}", out_path.display());
    }

    Ok(())
}
