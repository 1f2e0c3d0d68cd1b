use groom_scheduler_lib::application::dto::GridView;

pub fn show_grid_debug_data(grid: &GridView) {
    println!("\n=======================================================");
    println!("🗓️ [DEBUG] スケジュール (バン {} 台 x {} 日)", grid.rows.len(), grid.days.len());
    println!("=======================================================");

    let header: Vec<String> = grid.days.iter().map(|d| d.format("%m-%d").to_string()).collect();
    println!("{:<12} | {}", "", header.join(" | "));

    for row in &grid.rows {
        let cells: Vec<String> = row
            .cells
            .iter()
            .map(|cell| {
                // 重複は * を付ける
                let mark = if cell.duplicate { "*" } else { "" };
                if cell.assignment.is_empty() {
                    format!("{:<5}", "-")
                } else {
                    format!("{:<5}", format!("{}{}", cell.assignment, mark))
                }
            })
            .collect();
        println!("{:<12} | {}", row.van.name, cells.join(" | "));
    }
}
