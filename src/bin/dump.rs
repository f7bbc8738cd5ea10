use bzn::{ClassRegistry, FormatWalker, Hints, LabelResolver, SectionTrace, TokenStream};
use std::{env, fs, process};

fn main() {
    let mut args = env::args().skip(1);
    let path = match args.next() {
        Some(path) => path,
        None => {
            eprintln!("usage: dump <file.bzn> [class-labels.tsv]");
            process::exit(2);
        }
    };
    let data = match fs::read(&path) {
        Ok(data) => data,
        Err(err) => {
            eprintln!("{}: {}", path, err);
            process::exit(1);
        }
    };
    if let Err(err) = run(&data, args.next()) {
        eprintln!("{}", err);
        process::exit(1);
    }
}

fn run(data: &[u8], hints_path: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let mut stream = TokenStream::new(data)?;
    println!("format:  {}", stream.format());
    println!("version: {}", stream.version());
    println!("binary:  {}", stream.in_binary());

    let registry = ClassRegistry::new(stream.format())?;
    let resolver = match hints_path {
        Some(path) => {
            let mut hints = Hints::new(false);
            hints.parse_class_labels(&fs::read_to_string(path)?);
            Some(LabelResolver::new(&hints, &registry))
        }
        None => None,
    };

    let mut trace = SectionTrace::new();
    let mut walker = FormatWalker::new(&registry).with_sink(&mut trace);
    if let Some(resolver) = resolver.as_ref() {
        walker = walker.with_resolver(resolver);
    }
    let doc = walker.decode(&mut stream)?;

    println!("save type: {:?}", doc.save_type);
    if let Some(terrain) = &doc.terrain_name {
        println!("terrain:   {}", terrain);
    }
    if let Some(name) = &doc.mission.name {
        println!("mission:   {}", name);
    }
    if let Some(dll) = &doc.mission.dll_name {
        println!("dll:       {}", dll);
    }

    println!("entities:  {}", doc.entities.len());
    let pad = doc.entities.len().to_string().len();
    for (i, entity) in doc.entities.iter().enumerate() {
        println!(
            "  [{:>pad$}] {:08X} {:<16} {}",
            i,
            entity.seq_no,
            entity.class_identifier,
            entity.object.class_label(),
        );
    }

    println!("aois:      {}", doc.aois.len());
    println!("paths:     {}", doc.ai_paths.len());
    for path in &doc.ai_paths {
        println!(
            "  {:<24} {} points",
            path.label.as_deref().unwrap_or(""),
            path.points.len()
        );
    }

    if !doc.malformations.is_empty() {
        println!("malformations:");
        for record in &doc.malformations {
            println!("  {:?} {} {}", record.kind, record.field, record.detail);
        }
    }

    println!("sections: {}", trace.sections().join(" > "));
    Ok(())
}
