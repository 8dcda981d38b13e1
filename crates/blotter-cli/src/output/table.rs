use blotter_core::DocumentRecords;

pub fn print(documents: &[(String, DocumentRecords)]) {
    let multiple = documents.len() > 1;
    for (i, (document_id, doc)) in documents.iter().enumerate() {
        if multiple {
            if i > 0 {
                println!();
            }
            println!("--- {document_id} ---\n");
        }
        print_document(doc);
    }
}

fn print_document(doc: &DocumentRecords) {
    if doc.pairs.is_empty() {
        println!("No booking records found ({} page(s) read).", doc.pages_processed);
        return;
    }

    let max_name = doc
        .pairs
        .iter()
        .map(|p| p.record.name.len())
        .max()
        .unwrap_or(10);

    println!(
        "{:>4}  {:<width$}  {:<22}  {:<10}  {:<3}  {:<5}  {}",
        "Page",
        "Name",
        "Booked",
        "DOB",
        "Sex",
        "Photo",
        "Brought by",
        width = max_name
    );
    for pair in &doc.pairs {
        let r = &pair.record;
        let photo = if pair.has_image() { "yes" } else { "-" };
        println!(
            "{:>4}  {:<width$}  {:<22}  {:<10}  {:<3}  {:<5}  {}",
            pair.page_number,
            r.name,
            r.booked_at,
            r.date_of_birth,
            r.gender,
            photo,
            r.brought_by,
            width = max_name
        );
        for charge in &r.charges {
            println!("{:>4}  {:<width$}    {}", "", "", charge, width = max_name);
        }
    }

    println!(
        "\n{} record(s), {} with mugshots, from {} page(s)",
        doc.pairs.len(),
        doc.images_assigned(),
        doc.pages_processed
    );
}
