//! Print the Exif, IPTC and XMP metadata of an image
//!
//! Pass a key and one or more values after the path to replace that entry
//! and write the file back:
//!
//! ```text
//! cargo run --example dump -- photo.jpg
//! cargo run --example dump -- photo.jpg Iptc.Application2.Caption "A New Caption"
//! ```

use std::env;

use metakit::{ImageFactory, MetadataContainer};

fn print_container<C: MetadataContainer>(title: &str, container: &C) {
    println!("{} ({} entries)", title, container.len());
    for (key, value) in container.each() {
        println!("  {:<45} {}", key, value);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let path = match args.len() {
        // args[0] = path to executable
        n if n >= 2 => &args[1],
        _ => {
            eprintln!("usage: dump <image> [<key> <value>...]");
            std::process::exit(1);
        }
    };

    let image = ImageFactory::open(path)?;
    image.read_metadata()?;

    if let Some(key) = args.get(2) {
        let values: Vec<&str> = args[3..].iter().map(String::as_str).collect();
        let updated = if key.starts_with("Exif.") {
            image.exif_data().set(key, &values)?
        } else if key.starts_with("Iptc.") {
            image.iptc_data().set(key, &values)?
        } else {
            image.xmp_data().set(key, &values)?
        };
        if !updated {
            eprintln!("{}: some values were rejected", key);
        }
        image.write_metadata()?;
        image.read_metadata()?;
    }

    print_container("Exif", &image.exif_data());
    print_container("IPTC", &image.iptc_data());
    print_container("XMP", &image.xmp_data());
    Ok(())
}

fn main() {
    env_logger::init();
    metakit::initialize();

    if let Err(err) = run() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
