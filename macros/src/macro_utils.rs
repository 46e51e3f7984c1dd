use proc_macro::TokenStream;
use proc_macro2::Ident;
use quote::{format_ident, quote};
use std::env;
use std::fs::OpenOptions;
use std::io::Write;

pub fn write_to_local_file(lines: Vec<String>, dir_name: &str, file_name: &str) {
    let Ok(current_dir) = env::current_dir() else { return };
    let dir_path = current_dir.join("target").join("macros").join(dir_name);
    if let Err(e) = std::fs::create_dir_all(&dir_path) {
        eprintln!("Failed to create directory {:?}: {}", dir_path, e);
        return;
    }
    let full_path = dir_path.join(file_name);

    #[cfg(not(test))]
    {
        if let Err(e) = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&full_path)
            .and_then(|mut file| file.write_all(lines.join("\n").as_bytes()))
        {
            eprintln!("Failed to write to {:?}: {}", full_path, e);
        }
    }
}

/// Dumps the pretty printed expansion under `target/macros/{dir}` and hands the stream back.
pub fn submit_struct_to_stream(stream: proc_macro2::TokenStream, dir: &str, struct_ident: &Ident, suffix: &str) -> TokenStream {
    let formatted_token_stream =
        match syn::parse2::<syn::File>(stream.clone()) {
            Ok(ast) => prettyplease::unparse(&ast),
            Err(_) => stream.to_string(),
        };

    write_to_local_file(vec![formatted_token_stream], dir, &format!("{}{}", struct_ident, suffix));

    quote! {
        #stream
    }.into()
}

/// Raw identifiers keep their `r#` only at the front, `r#type` -> `set_type`.
pub fn prefixed(prefix: &str, ident: &Ident) -> Ident {
    format_ident!("{}_{}", prefix, unraw(ident))
}

pub fn suffixed(ident: &Ident, suffix: &str) -> Ident {
    format_ident!("{}_{}", unraw(ident), suffix)
}

pub fn unraw(ident: &Ident) -> String {
    let name = ident.to_string();
    name.strip_prefix("r#").map(str::to_string).unwrap_or(name)
}
